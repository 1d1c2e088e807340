use std::collections::HashMap;

use crate::summary::config_reader::Encoding;

/// Decodes a raw field. Latin-1 maps every byte to the code point of the same value.
pub fn decode_field(bytes: &[u8], encoding: Encoding) -> String {
    match encoding {
        Encoding::Latin1 => bytes.iter().map(|&b| b as char).collect(),
        Encoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Maps the names in a header row to their column index.
///
/// Names are trimmed and a leading byte order mark is ignored. With duplicated
/// names, the last column wins.
pub fn header_index<'a, I>(names: I) -> HashMap<String, usize>
where
    I: IntoIterator<Item = &'a str>,
{
    names
        .into_iter()
        .enumerate()
        .map(|(idx, name)| (name.trim_start_matches('\u{feff}').trim().to_string(), idx))
        .collect()
}

/// The file name of the standalone summary of a city.
pub fn city_file_name(city: &str) -> String {
    format!("{}.json", city.replace(' ', "_").replace('\'', "").to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latin1_is_decoded() {
        let bytes: &[u8] = &[b'N', b'I', b'T', b'E', b'R', b'\xd3', b'I'];
        assert_eq!(decode_field(bytes, Encoding::Latin1), "NITERÓI");
    }

    #[test]
    fn utf8_is_decoded() {
        assert_eq!(decode_field("Seção".as_bytes(), Encoding::Utf8), "Seção");
    }

    #[test]
    fn header_ignores_bom_and_spaces() {
        let idx = header_index(vec!["\u{feff}NR_ZONA", " NR_SECAO "]);
        assert_eq!(idx.get("NR_ZONA"), Some(&0));
        assert_eq!(idx.get("NR_SECAO"), Some(&1));
    }

    #[test]
    fn city_names_become_file_names() {
        assert_eq!(city_file_name("RIO DE JANEIRO"), "RIO_DE_JANEIRO.json");
        assert_eq!(city_file_name("Pau d'Alho"), "PAU_DALHO.json");
    }
}
