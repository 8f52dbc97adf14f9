// src/aggregate/finalize.rs
use crate::aggregate::types::CanonicalEvent;
use crate::error::AggregationError;

/// Fill missing images with the placeholder and check every event before it leaves.
///
/// Order is kept as produced by the merge index. An event missing a key field or
/// with misaligned links is an aggregation fault, not something to patch over.
pub fn finalize(
    events: Vec<CanonicalEvent>,
    placeholder_image: &str,
) -> Result<Vec<CanonicalEvent>, AggregationError> {
    events
        .into_iter()
        .map(|mut ev| {
            verify(&ev)?;
            if ev.image.trim().is_empty() {
                ev.image = placeholder_image.to_string();
            }
            Ok(ev)
        })
        .collect()
}

fn verify(ev: &CanonicalEvent) -> Result<(), AggregationError> {
    for (field, value) in [("title", &ev.title), ("time", &ev.time), ("source", &ev.source)] {
        if value.trim().is_empty() {
            return Err(AggregationError::MissingKeyField { field });
        }
    }
    if ev.options.len() != ev.buttons.len() {
        return Err(AggregationError::MisalignedLinks {
            title: ev.title.clone(),
            options: ev.options.len(),
            buttons: ev.buttons.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(image: &str) -> CanonicalEvent {
        CanonicalEvent {
            time: "14:00".into(),
            title: "GP Race".into(),
            options: vec!["u1".into()],
            buttons: vec!["FEEDA".into()],
            category: "Other".into(),
            language: "Unknown".into(),
            date: "2024-05-01".into(),
            source: "s1".into(),
            image: image.into(),
            status: "Unknown".into(),
        }
    }

    #[test]
    fn placeholder_only_replaces_blank_images() {
        let out = finalize(vec![sample(""), sample("poster.jpg")], "/ph.png").unwrap();
        assert_eq!(out[0].image, "/ph.png");
        assert_eq!(out[1].image, "poster.jpg");
        assert_eq!(out[0].buttons, vec!["FEEDA"]);
    }

    #[test]
    fn missing_source_is_an_error() {
        let mut ev = sample("");
        ev.source.clear();
        let err = finalize(vec![ev], "/ph.png").unwrap_err();
        assert!(matches!(err, AggregationError::MissingKeyField { field: "source" }));
    }

    #[test]
    fn misaligned_links_are_an_error() {
        let mut ev = sample("");
        ev.buttons.push("extra".into());
        assert!(matches!(
            finalize(vec![ev], "/ph.png"),
            Err(AggregationError::MisalignedLinks { options: 1, buttons: 2, .. })
        ));
    }
}
