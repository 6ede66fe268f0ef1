fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use driveup_protocol::{
        Base64Envelope, PayloadMode, RequestBody, ResponsePayload, UploadOutcome, UploadQuery,
    };
    use driveup_transfer::{encode_base64, to_signed_bytes};

    /// Bytes behind the request fixtures: a PDF magic plus high-bit values.
    const SAMPLE_BYTES: [u8; 8] = [0x25, 0x50, 0x44, 0x46, 0xFF, 0x80, 0x00, 0x7F];

    /// Returns the path to the fixtures directory.
    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    /// Loads a fixture JSON file and returns it as a `serde_json::Value`.
    fn load_fixture(name: &str) -> serde_json::Value {
        let path = fixtures_dir().join(name);
        let data = fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()));
        serde_json::from_str(&data)
            .unwrap_or_else(|e| panic!("failed to parse fixture {}: {e}", path.display()))
    }

    /// Deserializes a fixture into a Rust type, re-serializes it, and compares
    /// the JSON values (order-independent comparison).
    fn roundtrip_test<T>(name: &str) -> T
    where
        T: serde::de::DeserializeOwned + serde::Serialize,
    {
        let fixture = load_fixture(name);
        let parsed: T = serde_json::from_value(fixture.clone())
            .unwrap_or_else(|e| panic!("failed to deserialize {name}: {e}"));
        let reserialized = serde_json::to_value(&parsed)
            .unwrap_or_else(|e| panic!("failed to re-serialize {name}: {e}"));

        assert_eq!(
            fixture, reserialized,
            "roundtrip mismatch for {name}:\n  fixture: {fixture}\n  Rust:    {reserialized}"
        );
        parsed
    }

    /// Collects query pairs into a JSON object for comparison.
    fn query_value(query: &UploadQuery<'_>) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> = query
            .pairs()
            .into_iter()
            .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.to_string())))
            .collect();
        serde_json::Value::Object(map)
    }

    // --- Outbound ---

    #[test]
    fn fixture_request_base64() {
        let parsed = roundtrip_test::<RequestBody>("request_base64.json");
        assert_eq!(parsed.mode(), PayloadMode::Base64);

        let built = RequestBody::Base64(Base64Envelope::new(
            "final-report.pdf",
            "application/pdf",
            encode_base64(&SAMPLE_BYTES),
            Some("relay-secret"),
        ));
        assert_eq!(built, parsed);

        let wire: serde_json::Value = serde_json::from_str(&built.to_json().unwrap()).unwrap();
        assert_eq!(wire, load_fixture("request_base64.json"));
    }

    #[test]
    fn fixture_request_byte_array() {
        let parsed = roundtrip_test::<RequestBody>("request_byte_array.json");
        assert_eq!(parsed.mode(), PayloadMode::ByteArray);

        let built = RequestBody::ByteArray(to_signed_bytes(&SAMPLE_BYTES));
        assert_eq!(built, parsed);

        let wire: serde_json::Value = serde_json::from_str(&built.to_json().unwrap()).unwrap();
        assert!(wire.is_array(), "byte-array body must not be wrapped");
        assert_eq!(wire, load_fixture("request_byte_array.json"));
    }

    #[test]
    fn fixture_query_byte_array_carries_key() {
        let query = UploadQuery::new(
            "final-report.pdf",
            "application/pdf",
            PayloadMode::ByteArray,
            Some("relay-secret"),
        );
        assert_eq!(query_value(&query), load_fixture("query_byte_array.json"));
    }

    #[test]
    fn fixture_query_base64_omits_key() {
        let query = UploadQuery::new(
            "final-report.pdf",
            "application/pdf",
            PayloadMode::Base64,
            Some("relay-secret"),
        );
        assert_eq!(query_value(&query), load_fixture("query_base64.json"));
    }

    // --- Inbound ---

    #[test]
    fn fixture_response_success() {
        let payload = ResponsePayload::from(load_fixture("response_success.json"));
        assert!(payload.error().is_none());

        let outcome = UploadOutcome::from_response(payload, "local-name.pdf");
        assert!(outcome.success);
        assert_eq!(outcome.file_name, "final-report.pdf");
        assert_eq!(outcome.file_id, "abc123");
        assert_eq!(
            outcome.file_url,
            "https://drive.google.com/file/d/abc123/view"
        );
    }

    #[test]
    fn fixture_response_aliases() {
        let payload = ResponsePayload::from(load_fixture("response_aliases.json"));
        let outcome = UploadOutcome::from_response(payload, "local-name.pdf");
        assert_eq!(outcome.file_name, "local-name.pdf");
        assert_eq!(outcome.file_id, "xyz789");
        assert_eq!(
            outcome.file_url,
            "https://drive.google.com/file/d/xyz789/view"
        );
    }

    #[test]
    fn fixture_response_error() {
        let payload = ResponsePayload::from(load_fixture("response_error.json"));
        assert_eq!(payload.error().as_deref(), Some("Invalid API key"));
    }

    #[test]
    fn fixture_upload_outcome() {
        let outcome = roundtrip_test::<UploadOutcome>("upload_outcome.json");
        assert_eq!(outcome.file_id, "abc123");
    }
}
