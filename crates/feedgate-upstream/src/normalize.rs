//! Payload normalizers: reshape raw provider payloads into the
//! gateway's response shapes.
//!
//! Shape problems are reported per-field as `ok:false` objects with a
//! reason code wherever the caller asked for a best-effort aggregate;
//! only the single-dataset simplifiers fail the whole payload.

use crate::air::DustKind;
use feedgate_core::{Error, Result};
use regex::Regex;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

/// Flatten an hourly nowcast payload: the provider reports one item per
/// observation category.
pub fn simplify_ultra_nowcast(data: &Value) -> Result<Value> {
    let items = data["response"]["body"]["items"]["item"]
        .as_array()
        .ok_or_else(|| Error::PayloadShape("response.body.items.item".into()))?;
    let first = items
        .first()
        .ok_or_else(|| Error::PayloadShape("empty items".into()))?;

    let mut values: BTreeMap<&str, &Value> = BTreeMap::new();
    for item in items {
        if let Some(category) = item.get("category").and_then(Value::as_str) {
            if let Some(value) = item.get("obsrValue") {
                values.insert(category, value);
            }
        }
    }

    Ok(json!({
        "baseDate": first.get("baseDate").cloned().unwrap_or(Value::Null),
        "baseTime": first.get("baseTime").cloned().unwrap_or(Value::Null),
        "nx": first.get("nx").cloned().unwrap_or(Value::Null),
        "ny": first.get("ny").cloned().unwrap_or(Value::Null),
        "temperature_c": to_number(values.get("T1H").copied()),
        "humidity_pct": to_number(values.get("REH").copied()),
        "rain_1h_mm": to_number(values.get("RN1").copied()),
        "precip_type": values.get("PTY").copied().cloned().unwrap_or(Value::Null),
        "wind_speed_ms": to_number(values.get("WSD").copied()),
        "wind_dir_deg": to_number(values.get("VEC").copied()),
    }))
}

/// Categories kept in the simplified short forecast.
const SHORT_CATEGORIES: &[&str] = &["TMP", "POP", "SKY", "PTY", "REH", "WSD"];
const SHORT_NUMERIC: &[&str] = &["TMP", "POP", "REH", "WSD"];

/// Bucket short-forecast items by forecast slot, keeping a fixed
/// category subset, sorted chronologically.
pub fn simplify_short_forecast(data: &Value, nx: i64, ny: i64) -> Value {
    let items = match data["response"]["body"]["items"]["item"].as_array() {
        Some(items) if !items.is_empty() => items,
        _ => return json!({"nx": nx, "ny": ny, "hourly": []}),
    };

    let mut slots: BTreeMap<(String, String), Map<String, Value>> = BTreeMap::new();
    for item in items {
        let (Some(date), Some(time), Some(category)) = (
            item.get("fcstDate").and_then(Value::as_str),
            item.get("fcstTime").and_then(Value::as_str),
            item.get("category").and_then(Value::as_str),
        ) else {
            continue;
        };
        if !SHORT_CATEGORIES.contains(&category) {
            continue;
        }
        let value = item.get("fcstValue").cloned().unwrap_or(Value::Null);

        let slot = slots
            .entry((date.to_string(), time.to_string()))
            .or_insert_with(|| {
                let mut slot = Map::new();
                slot.insert("fcstDate".into(), Value::String(date.to_string()));
                slot.insert("fcstTime".into(), Value::String(time.to_string()));
                slot
            });
        let value = if SHORT_NUMERIC.contains(&category) {
            to_number(Some(&value))
        } else {
            value
        };
        slot.insert(category.to_string(), value);
    }

    let hourly: Vec<Value> = slots.into_values().map(Value::Object).collect();
    let first = &items[0];
    json!({
        "baseDate": first.get("baseDate").cloned().unwrap_or(Value::Null),
        "baseTime": first.get("baseTime").cloned().unwrap_or(Value::Null),
        "nx": nx,
        "ny": ny,
        "hourly": hourly,
    })
}

/// Extract a region's forecast grade from the dust-dispatch XML.
///
/// The provider rolls every region into one `informGrade` string
/// (`"서울 : 보통, 인천 : 나쁨, ..."`); the grade is pulled out of the
/// item whose `informData` matches the requested date.
pub fn forecast_grade(xml: &str, target_date: &str, region: &str) -> Value {
    let Ok(item_re) = Regex::new(r"(?s)<item>(.*?)</item>") else {
        return json!({"ok": false, "reason": "PARSE_ERROR"});
    };
    let Ok(grade_re) = Regex::new(&format!(r"{}\s*:\s*([^,]+)", regex::escape(region))) else {
        return json!({"ok": false, "reason": "PARSE_ERROR"});
    };

    for captures in item_re.captures_iter(xml) {
        let block = &captures[1];
        if tag_text(block, "informData") != Some(target_date.trim()) {
            continue;
        }

        let data_time = tag_text(block, "dataTime").unwrap_or_default();
        let inform_grade = tag_text(block, "informGrade").unwrap_or_default();

        return match grade_re.captures(inform_grade) {
            Some(m) => json!({
                "ok": true,
                "dataTime": data_time,
                "grade": m[1].trim(),
            }),
            None => json!({
                "ok": false,
                "reason": "REGION_NOT_FOUND",
                "dataTime": data_time,
                "raw": inform_grade,
            }),
        };
    }

    json!({"ok": false, "reason": "DATE_NOT_FOUND"})
}

/// Pull a realtime measurement out of the per-station rows: a single
/// station's value when requested, else average/min/max across the
/// province.
pub fn realtime_value(data: &Value, kind: DustKind, station: Option<&str>) -> Value {
    let Some(items) = data["response"]["body"]["items"].as_array() else {
        return json!({"ok": false, "reason": "PARSE_ERROR", "kind": kind.code()});
    };

    let mut rows: Vec<(Option<&str>, Option<&str>, i64)> = Vec::new();
    for item in items {
        let station_name = item.get("stationName").and_then(Value::as_str);
        if let Some(wanted) = station {
            if station_name != Some(wanted) {
                continue;
            }
        }
        // Offline stations report "-" for the value; skip them.
        let Some(value) = item.get(kind.value_field()).and_then(to_int) else {
            continue;
        };
        rows.push((station_name, item.get("dataTime").and_then(Value::as_str), value));
    }

    let Some((_, data_time, first_value)) = rows.first().copied() else {
        return json!({
            "ok": false,
            "reason": "NO_DATA",
            "kind": kind.code(),
            "station": station,
        });
    };

    if let Some(station) = station {
        return json!({
            "ok": true,
            "kind": kind.code(),
            "dataTime": data_time,
            "station": station,
            "value": first_value,
        });
    }

    let values: Vec<i64> = rows.iter().map(|(_, _, v)| *v).collect();
    let mean = values.iter().sum::<i64>() as f64 / values.len() as f64;
    json!({
        "ok": true,
        "kind": kind.code(),
        "dataTime": data_time,
        "agg": "avg",
        "value": (mean * 10.0).round() / 10.0,
        "min": values.iter().min(),
        "max": values.iter().max(),
        "count": values.len(),
    })
}

/// Coerce a provider value to a JSON number where it parses as one,
/// passing the original through otherwise.
fn to_number(value: Option<&Value>) -> Value {
    match value {
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(s.clone())),
        Some(other) => other.clone(),
        None => Value::Null,
    }
}

/// Integer coercion for measurement values; `-` and empty strings are
/// missing data.
fn to_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_f64().map(|f| f as i64),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() || s == "-" {
                return None;
            }
            s.parse::<f64>().ok().map(|f| f as i64)
        }
        _ => None,
    }
}

fn tag_text<'a>(block: &'a str, tag: &str) -> Option<&'a str> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");
    let start = block.find(&open)? + open.len();
    let end = block[start..].find(&close)? + start;
    Some(block[start..end].trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ultra_body() -> Value {
        json!({"response": {"header": {"resultCode": "00"}, "body": {"items": {"item": [
            {"baseDate": "20250310", "baseTime": "1100", "nx": 60, "ny": 127, "category": "T1H", "obsrValue": "3.5"},
            {"baseDate": "20250310", "baseTime": "1100", "nx": 60, "ny": 127, "category": "REH", "obsrValue": "40"},
            {"baseDate": "20250310", "baseTime": "1100", "nx": 60, "ny": 127, "category": "RN1", "obsrValue": "0"},
            {"baseDate": "20250310", "baseTime": "1100", "nx": 60, "ny": 127, "category": "PTY", "obsrValue": "0"},
            {"baseDate": "20250310", "baseTime": "1100", "nx": 60, "ny": 127, "category": "WSD", "obsrValue": "1.9"},
            {"baseDate": "20250310", "baseTime": "1100", "nx": 60, "ny": 127, "category": "VEC", "obsrValue": "250"}
        ]}}}})
    }

    #[test]
    fn test_simplify_ultra_nowcast() {
        let simplified = simplify_ultra_nowcast(&ultra_body()).expect("simplify");
        assert_eq!(simplified["baseDate"], "20250310");
        assert_eq!(simplified["temperature_c"], json!(3.5));
        assert_eq!(simplified["humidity_pct"], json!(40.0));
        assert_eq!(simplified["precip_type"], "0");
    }

    #[test]
    fn test_simplify_ultra_nowcast_rejects_bad_shape() {
        let err = simplify_ultra_nowcast(&json!({"response": {}})).expect_err("bad shape");
        assert!(matches!(err, Error::PayloadShape(_)));
    }

    #[test]
    fn test_simplify_short_forecast_buckets_and_sorts() {
        let body = json!({"response": {"body": {"items": {"item": [
            {"baseDate": "20250310", "baseTime": "1100", "fcstDate": "20250310", "fcstTime": "1500", "category": "TMP", "fcstValue": "8"},
            {"baseDate": "20250310", "baseTime": "1100", "fcstDate": "20250310", "fcstTime": "1200", "category": "TMP", "fcstValue": "6"},
            {"baseDate": "20250310", "baseTime": "1100", "fcstDate": "20250310", "fcstTime": "1200", "category": "SKY", "fcstValue": "1"},
            {"baseDate": "20250310", "baseTime": "1100", "fcstDate": "20250310", "fcstTime": "1200", "category": "UUU", "fcstValue": "0.4"}
        ]}}}});
        let simplified = simplify_short_forecast(&body, 60, 127);
        let hourly = simplified["hourly"].as_array().expect("hourly");
        assert_eq!(hourly.len(), 2);
        // Chronological order, discarded categories absent.
        assert_eq!(hourly[0]["fcstTime"], "1200");
        assert_eq!(hourly[0]["TMP"], json!(6.0));
        assert_eq!(hourly[0]["SKY"], "1");
        assert!(hourly[0].get("UUU").is_none());
        assert_eq!(hourly[1]["fcstTime"], "1500");
    }

    #[test]
    fn test_simplify_short_forecast_empty_items() {
        let simplified = simplify_short_forecast(&json!({"response": {}}), 60, 127);
        assert_eq!(simplified, json!({"nx": 60, "ny": 127, "hourly": []}));
    }

    const FORECAST_XML: &str = "<response><body><items>\
        <item><dataTime>2025-03-10 11시 발표</dataTime>\
        <informData>2025-03-10</informData>\
        <informGrade>서울 : 보통, 인천 : 나쁨</informGrade></item>\
        <item><dataTime>2025-03-10 11시 발표</dataTime>\
        <informData>2025-03-11</informData>\
        <informGrade>서울 : 좋음</informGrade></item>\
        </items></body></response>";

    #[test]
    fn test_forecast_grade_matches_date_and_region() {
        let grade = forecast_grade(FORECAST_XML, "2025-03-10", "서울");
        assert_eq!(grade["ok"], true);
        assert_eq!(grade["grade"], "보통");

        let grade = forecast_grade(FORECAST_XML, "2025-03-11", "서울");
        assert_eq!(grade["grade"], "좋음");
    }

    #[test]
    fn test_forecast_grade_missing_date_or_region() {
        let grade = forecast_grade(FORECAST_XML, "2025-03-12", "서울");
        assert_eq!(grade["ok"], false);
        assert_eq!(grade["reason"], "DATE_NOT_FOUND");

        let grade = forecast_grade(FORECAST_XML, "2025-03-10", "부산");
        assert_eq!(grade["ok"], false);
        assert_eq!(grade["reason"], "REGION_NOT_FOUND");
    }

    fn realtime_body() -> Value {
        json!({"response": {"body": {"items": [
            {"stationName": "중구", "dataTime": "2025-03-10 11:00", "pm10Value": "31", "pm25Value": "18"},
            {"stationName": "종로구", "dataTime": "2025-03-10 11:00", "pm10Value": "45", "pm25Value": "-"},
            {"stationName": "마포구", "dataTime": "2025-03-10 11:00", "pm10Value": "-", "pm25Value": "20"}
        ]}}})
    }

    #[test]
    fn test_realtime_value_aggregates() {
        let value = realtime_value(&realtime_body(), DustKind::Pm10, None);
        assert_eq!(value["ok"], true);
        assert_eq!(value["agg"], "avg");
        assert_eq!(value["value"], json!(38.0));
        assert_eq!(value["min"], json!(31));
        assert_eq!(value["max"], json!(45));
        assert_eq!(value["count"], json!(2));
    }

    #[test]
    fn test_realtime_value_single_station() {
        let value = realtime_value(&realtime_body(), DustKind::Pm25, Some("중구"));
        assert_eq!(value["ok"], true);
        assert_eq!(value["station"], "중구");
        assert_eq!(value["value"], json!(18));
    }

    #[test]
    fn test_realtime_value_no_data() {
        let value = realtime_value(&realtime_body(), DustKind::Pm25, Some("강남구"));
        assert_eq!(value["ok"], false);
        assert_eq!(value["reason"], "NO_DATA");
    }
}
