use calamine::{open_workbook, DataType, Range, Reader, Xlsx};

use crate::summary::{io_common::header_index, *};

/// Reads the neighborhood reference table from an Excel workbook.
///
/// The first row holds the column names. Numbers may be stored either as
/// text or as numeric cells.
pub fn read_geo_rows(path: &Path, config: &RunConfig) -> SummaryResult<Vec<GeoRow>> {
    let path_s = path.display().to_string();
    let wrange = get_range(&path_s, config.geo_worksheet_name.as_deref())?;

    let mut iter = wrange.rows();
    let header = iter.next().context(EmptyExcelSnafu {
        path: path_s.clone(),
    })?;
    let names: Vec<String> = header.iter().map(|c| cell_text(c).unwrap_or_default()).collect();
    debug!("read_geo_rows: header: {:?}", names);
    let col_index = header_index(names.iter().map(|s| s.as_str()));

    let columns = &config.columns;
    let mut col_indexes: Vec<usize> = Vec::new();
    for name in columns.required_geo_columns() {
        let idx = col_index.get(name).context(MissingColumnSnafu {
            path: path_s.clone(),
            column: name,
        })?;
        col_indexes.push(*idx);
    }

    let mut res: Vec<GeoRow> = Vec::new();
    for row in iter {
        let get = |i: usize| row.get(col_indexes[i]).and_then(cell_text);
        res.push(GeoRow {
            zone: get(0),
            polling_place: get(1),
            section: get(2),
            neighborhood: get(3),
        });
    }
    info!("read_geo_rows: {} rows read from {}", res.len(), path_s);
    Ok(res)
}

fn get_range(path: &str, worksheet_name_o: Option<&str>) -> SummaryResult<Range<DataType>> {
    debug!("get_range: path: {:?} worksheet: {:?}", path, worksheet_name_o);
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;

    if let Some(worksheet_name) = worksheet_name_o {
        workbook
            .worksheet_range(worksheet_name)
            .context(MissingWorksheetSnafu {
                path,
                worksheet: worksheet_name,
            })?
            .context(OpeningExcelSnafu { path })
    } else {
        workbook
            .worksheet_range_at(0)
            .context(EmptyExcelSnafu { path })?
            .context(OpeningExcelSnafu { path })
    }
}

/// The content of a cell as text. Whole floats lose their decimal part.
fn cell_text(cell: &DataType) -> Option<String> {
    match cell {
        DataType::String(s) => Some(s.clone()),
        DataType::Int(i) => Some(i.to_string()),
        DataType::Float(f) if f.fract() == 0.0 => Some(format!("{}", *f as i64)),
        DataType::Float(f) => Some(f.to_string()),
        DataType::Bool(b) => Some(b.to_string()),
        DataType::Empty => None,
        _ => {
            debug!("cell_text: could not understand cell {:?}", cell);
            None
        }
    }
}
