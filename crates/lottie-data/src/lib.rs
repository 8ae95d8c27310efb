// lottie-data: Serde model and JSON I/O for Lottie documents
pub mod error;
pub mod io;
pub mod model;

pub use error::LottieError;
pub use model::{Asset, AssetKind, Layer, LottieJson};

#[cfg(test)]
mod tests {
    use super::model::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_minimal() {
        let data = json!({
            "v": "5.5.2",
            "ip": 0,
            "op": 60,
            "fr": 60,
            "w": 500,
            "h": 500,
            "layers": []
        });
        let lottie: LottieJson = serde_json::from_value(data).unwrap();
        assert_eq!(lottie.w.as_ref().and_then(serde_json::Number::as_u64), Some(500));
        assert_eq!(lottie.out_point(), Some(60.0));
        assert!(lottie.assets.is_empty());
    }

    #[test]
    fn test_unknown_keys_survive() {
        let data = json!({
            "v": "5.7.4",
            "fr": 24,
            "layers": [
                {
                    "ty": 4,
                    "ind": 1,
                    "nm": "MyShape",
                    "ks": {},
                    "shapes": [{ "ty": "rc", "s": { "a": 0, "k": [100, 100] } }],
                    "hasMask": false
                }
            ],
            "meta": { "g": "LottieFiles" }
        });
        let lottie: LottieJson = serde_json::from_value(data.clone()).unwrap();
        assert_eq!(lottie.extra.get("meta"), data.get("meta"));

        let layer = &lottie.layers[0];
        assert_eq!(layer.extra.get("nm"), Some(&json!("MyShape")));
        assert_eq!(layer.extra.get("hasMask"), Some(&json!(false)));

        let back = serde_json::to_value(&lottie).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn test_integers_stay_integers() {
        let lottie = LottieJson::from_json_str(r#"{"fr":30,"ip":0,"op":90.5,"layers":[]}"#).unwrap();
        let out = lottie.to_compact_string().unwrap();
        assert!(out.contains(r#""fr":30"#), "{out}");
        assert!(out.contains(r#""ip":0"#), "{out}");
        assert!(out.contains(r#""op":90.5"#), "{out}");
    }

    #[test]
    fn test_asset_kind() {
        let data = json!({
            "layers": [],
            "assets": [
                { "id": "img_0", "w": 10, "h": 10, "u": "", "p": "data:image/png;base64,AAAA", "e": 1 },
                { "id": "img_1", "w": 10, "h": 10, "u": "images/", "p": "img_1.png", "e": 0 },
                { "id": "comp_0", "layers": [] },
                { "id": "snd" }
            ]
        });
        let lottie: LottieJson = serde_json::from_value(data).unwrap();
        let kinds: Vec<_> = lottie.assets.iter().map(Asset::kind).collect();
        assert_eq!(
            kinds,
            vec![
                AssetKind::EmbeddedImage,
                AssetKind::ExternalImage,
                AssetKind::Precomposition,
                AssetKind::Other
            ]
        );
        assert!(lottie.asset("comp_0").is_some());
        assert!(lottie.asset("missing").is_none());
    }

    #[test]
    fn test_number_from_f64() {
        assert_eq!(number_from_f64(30.0).unwrap().to_string(), "30");
        assert_eq!(number_from_f64(-0.0).unwrap().to_string(), "0");
        assert_eq!(number_from_f64(0.25).unwrap().to_string(), "0.25");
        assert!(number_from_f64(f64::NAN).is_none());
        assert!(number_eq(&serde_json::Number::from(1), 1.0));
    }
}
