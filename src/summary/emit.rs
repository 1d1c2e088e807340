// Conversion of the summaries to their JSON representation.
// The key names are read by other tools and must stay stable across years.

use serde_json::json;
use serde_json::Map as JSMap;

use crate::summary::*;

pub const CITIES_KEY: &str = "CIDADES";
pub const NEIGHBORHOODS_KEY: &str = "BAIRROS";
pub const TOTAL_KEY: &str = "total_validos";
pub const CANDIDATES_KEY: &str = "candidatos";

fn candidates_to_json(candidates: &[CandidateTally]) -> JSValue {
    let l: Vec<JSValue> = candidates
        .iter()
        .map(|c| {
            json!({
                "nome": c.name,
                "numero": c.ballot_number,
                "votos": c.votes,
                "sq_candidato": c.sequence_id,
                "posicao": c.rank,
            })
        })
        .collect();
    JSValue::Array(l)
}

fn scope_to_json(scope: &ScopeAggregate) -> JSMap<String, JSValue> {
    let mut js: JSMap<String, JSValue> = JSMap::new();
    js.insert(TOTAL_KEY.to_string(), json!(scope.total_votes));
    js.insert(
        CANDIDATES_KEY.to_string(),
        candidates_to_json(&scope.candidates),
    );
    js
}

fn city_to_json(city: &CityAggregate) -> JSValue {
    let mut js = scope_to_json(&city.scope);
    let mut neighborhoods: JSMap<String, JSValue> = JSMap::new();
    for (name, hood) in city.neighborhoods.iter() {
        neighborhoods.insert(name.clone(), JSValue::Object(scope_to_json(hood)));
    }
    js.insert(
        NEIGHBORHOODS_KEY.to_string(),
        JSValue::Object(neighborhoods),
    );
    JSValue::Object(js)
}

/// office -> {statewide total, cities -> {total, candidates, neighborhoods -> {total, candidates}}}
pub fn summary_to_json(summary: &Summary, state_total_key: &str) -> JSValue {
    let mut offices: JSMap<String, JSValue> = JSMap::new();
    for (office_name, office) in summary.offices.iter() {
        let mut cities: JSMap<String, JSValue> = JSMap::new();
        for (city_name, city) in office.cities.iter() {
            cities.insert(city_name.clone(), city_to_json(city));
        }
        let mut js: JSMap<String, JSValue> = JSMap::new();
        js.insert(state_total_key.to_string(), json!(office.statewide_votes));
        js.insert(CITIES_KEY.to_string(), JSValue::Object(cities));
        offices.insert(office_name.clone(), JSValue::Object(js));
    }
    JSValue::Object(offices)
}
