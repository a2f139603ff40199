use serde::Deserialize;

/// A list endpoint response: either a bare array or a paginated envelope.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Listing<T> {
    Bare(Vec<T>),
    Paged {
        results: Vec<T>,
        #[serde(default)]
        count: Option<u64>,
        #[serde(default)]
        next: Option<String>,
    },
}

impl<T> Listing<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Listing::Bare(items) | Listing::Paged { results: items, .. } => items,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::Persona;

    #[test]
    fn test_both_list_shapes_decode() {
        let bare: Listing<Persona> =
            serde_json::from_value(json!([{"id": "p1", "name": "A"}])).unwrap();
        let paged: Listing<Persona> = serde_json::from_value(json!({
            "count": 1, "next": null, "previous": null,
            "results": [{"id": "p1", "name": "A"}]
        }))
        .unwrap();

        assert_eq!(bare.into_vec(), paged.into_vec());
    }
}
