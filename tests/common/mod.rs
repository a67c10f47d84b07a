#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use gpu_worker::contract::{
    BucketHandle, CredentialMode, MockBucketHandle, MockStorageConnector, RemoteObject,
};
use gpu_worker::error::StoreError;

pub const CREDENTIAL: &str =
    r#"{"client_email":"sync@example.iam.gserviceaccount.com","private_key":"unused"}"#;

/// Objects of the documented provisioning scenario, in listing order.
pub fn scenario_objects() -> Vec<(&'static str, Vec<u8>)> {
    vec![
        ("models/a.bin", vec![0xDE, 0xAD, 0xBE, 0xEF]),
        ("models/sub/", vec![]),
        ("models/sub/b.bin", vec![0x01, 0x02]),
    ]
}

/// A bucket that lists `objects` once and serves their contents, recording
/// every fetched key.
pub fn scripted_bucket(
    objects: Vec<(&'static str, Vec<u8>)>,
    fetched: Arc<Mutex<Vec<String>>>,
) -> MockBucketHandle {
    let listing: Vec<RemoteObject> = objects
        .iter()
        .map(|(k, v)| RemoteObject::new(*k, v.len() as u64))
        .collect();
    let contents: HashMap<String, Vec<u8>> = objects
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

    let mut bucket = MockBucketHandle::new();
    bucket.expect_list().times(1).return_once(move || Ok(listing));
    bucket.expect_fetch().returning(move |key: &str| {
        fetched.lock().unwrap().push(key.to_string());
        contents
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    });
    bucket
}

/// A connector that hands out `bucket` exactly once.
pub fn connector_for(bucket: MockBucketHandle, mode: CredentialMode) -> MockStorageConnector {
    let mut connector = MockStorageConnector::new();
    connector.expect_credential_mode().return_const(mode);
    connector.expect_connect().times(1).return_once(move |_, _| {
        let handle: Box<dyn BucketHandle> = Box::new(bucket);
        Ok(handle)
    });
    connector
}

pub fn fetch_log() -> Arc<Mutex<Vec<String>>> {
    Arc::new(Mutex::new(Vec::new()))
}
