//! Query-string binding for list and map endpoints.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use works_portal_database_models::{BoundingBox, ListQuery, MapQuery};

use crate::form::{Form, normalize_key, parse_datetime};
use crate::{ServiceError, ValidationErrors};

/// Keys bound to paging or the date range rather than treated as filters.
const RESERVED: &[&str] = &["page", "limit", "start_date", "end_date"];

fn collect(pairs: &[(String, String)]) -> Form {
    pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect()
}

fn number(form: &Form, errors: &mut ValidationErrors, key: &str) -> u32 {
    form.get(key).map_or(0, |raw| {
        raw.parse().unwrap_or_else(|_| {
            errors.push(key, "integer");
            0
        })
    })
}

fn date_bounds(
    form: &Form,
    errors: &mut ValidationErrors,
) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
    let mut bound = |key: &str| {
        let raw = form.get(key)?;
        let parsed = parse_datetime(raw);
        if parsed.is_none() {
            errors.push(key, "datetime");
        }
        parsed
    };
    let start = bound("start_date");
    let mut end = bound("end_date");

    // A bare end date covers the whole day.
    if let (Some(at), Some(raw)) = (end, form.get("end_date"))
        && raw.len() == 10
    {
        end = Some(at + Duration::days(1) - Duration::seconds(1));
    }

    if let (Some(start), Some(end)) = (start, end)
        && start > end
    {
        errors.push("end_date", "gtefield=start_date");
    }
    (start, end)
}

/// Binds `page`, `limit`, the date range and free filters. The first
/// non-empty value of a repeated key wins.
///
/// # Errors
///
/// Returns [`ServiceError::Validation`] for non-numeric paging or
/// unparseable dates.
pub fn list_query(pairs: &[(String, String)]) -> Result<ListQuery, ServiceError> {
    let form = collect(pairs);
    let mut errors = ValidationErrors::new();

    let page = number(&form, &mut errors, "page");
    let limit = number(&form, &mut errors, "limit");
    let (start_date, end_date) = date_bounds(&form, &mut errors);

    let mut filters = BTreeMap::new();
    for (key, _) in pairs {
        let key = normalize_key(key);
        if RESERVED.contains(&key.as_str()) {
            continue;
        }
        if let Some(value) = form.get(&key) {
            filters.entry(key).or_insert_with(|| value.to_string());
        }
    }

    errors.into_result()?;
    Ok(ListQuery {
        page,
        limit,
        filters,
        start_date,
        end_date,
    }
    .clamped())
}

/// Binds `bbox=west,south,east,north`, the date range and `limit`.
///
/// # Errors
///
/// Returns [`ServiceError::Validation`] for a malformed box, limit or
/// date.
pub fn map_query(pairs: &[(String, String)]) -> Result<MapQuery, ServiceError> {
    let form = collect(pairs);
    let mut errors = ValidationErrors::new();

    let bbox = form.get("bbox").and_then(|raw| {
        let parsed = BoundingBox::parse(raw);
        if parsed.is_none() {
            errors.push("bbox", "bbox");
        }
        parsed
    });
    let limit = number(&form, &mut errors, "limit");
    let (start_date, end_date) = date_bounds(&form, &mut errors);

    errors.into_result()?;
    Ok(MapQuery {
        bbox,
        start_date,
        end_date,
        limit,
    })
}

#[cfg(test)]
mod tests {
    use works_portal_database_models::{DEFAULT_LIMIT, MAX_LIMIT};

    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn defaults_and_clamps_paging() {
        let q = list_query(&pairs(&[])).unwrap();
        assert_eq!((q.page, q.limit), (1, DEFAULT_LIMIT));
        assert!(q.is_default_page());

        let q = list_query(&pairs(&[("page", "0"), ("limit", "1000")])).unwrap();
        assert_eq!((q.page, q.limit), (1, MAX_LIMIT));
    }

    #[test]
    fn keeps_filters_and_skips_blank_ones() {
        let q = list_query(&pairs(&[
            ("district", "cibinong"),
            ("district", "ciawi"),
            ("village", ""),
            ("damageLevel", "severe"),
        ]))
        .unwrap();
        assert_eq!(q.filters.get("district").map(String::as_str), Some("cibinong"));
        assert_eq!(q.filters.get("damage_level").map(String::as_str), Some("severe"));
        assert!(!q.filters.contains_key("village"));
    }

    #[test]
    fn end_date_covers_the_day() {
        let q = list_query(&pairs(&[("start_date", "2024-05-01"), ("end_date", "2024-05-01")]))
            .unwrap();
        let end = q.end_date.unwrap();
        assert_eq!(end.to_rfc3339(), "2024-05-01T23:59:59+00:00");
        assert!(q.start_date.unwrap() < end);
    }

    #[test]
    fn rejects_bad_input() {
        let Err(ServiceError::Validation(errors)) =
            list_query(&pairs(&[("page", "two"), ("start_date", "yesterday")]))
        else {
            panic!("expected validation failure");
        };
        assert_eq!(errors.entries(), ["page: integer", "start_date: datetime"]);

        assert!(map_query(&pairs(&[("bbox", "1,2,3")])).is_err());
    }

    #[test]
    fn binds_map_box() {
        let q = map_query(&pairs(&[("bbox", "106.5,-6.7,107.0,-6.2"), ("limit", "50")])).unwrap();
        assert!(q.bbox.unwrap().contains(-6.5, 106.8));
        assert_eq!(q.effective_limit(), 50);
    }
}
