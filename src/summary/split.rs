// Partition of a summary by city. This is a reshape only: totals and ranks are
// copied as they are.

use std::collections::BTreeMap;

use serde_json::Map as JSMap;

use crate::summary::{
    emit::CITIES_KEY,
    io_common::city_file_name,
    *,
};

/// Splits a summary into one document per city.
///
/// Each document has, for every office in which the city appears, the
/// statewide total of the office and the data of that city only.
pub fn split_by_city(
    summary_js: &JSValue,
    state_total_key: &str,
) -> Option<BTreeMap<String, JSValue>> {
    let offices = summary_js.as_object()?;
    let mut by_city: BTreeMap<String, JSMap<String, JSValue>> = BTreeMap::new();
    for (office_name, office_js) in offices.iter() {
        let office = office_js.as_object()?;
        let statewide = office.get(state_total_key).cloned().unwrap_or(JSValue::Null);
        let cities = match office.get(CITIES_KEY) {
            Some(JSValue::Object(cities)) => cities.clone(),
            Some(_) => return None,
            None => JSMap::new(),
        };
        for (city_name, city_js) in cities.into_iter() {
            let mut city_only: JSMap<String, JSValue> = JSMap::new();
            city_only.insert(city_name.clone(), city_js);
            let mut office_slice: JSMap<String, JSValue> = JSMap::new();
            office_slice.insert(state_total_key.to_string(), statewide.clone());
            office_slice.insert(CITIES_KEY.to_string(), JSValue::Object(city_only));
            by_city
                .entry(city_name)
                .or_default()
                .insert(office_name.clone(), JSValue::Object(office_slice));
        }
    }
    Some(
        by_city
            .into_iter()
            .map(|(city, offices)| (city, JSValue::Object(offices)))
            .collect(),
    )
}

/// Writes one file per city in `dir`. Returns the number of files written.
pub fn write_city_files(
    dir: &Path,
    summary_js: &JSValue,
    config: &RunConfig,
) -> SummaryResult<usize> {
    let by_city =
        split_by_city(summary_js, &config.state_total_key).context(MalformedSummarySnafu {
            path: dir.display().to_string(),
        })?;
    for (city, city_js) in by_city.iter() {
        let path = dir.join(city_file_name(city));
        let contents = serde_json::to_string(city_js).context(SerializingJsonSnafu {})?;
        write_text(&path, &contents)?;
    }
    Ok(by_city.len())
}
