use std::collections::HashMap as Map;
use std::convert::TryFrom;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

use crate::error::Error;
use crate::vc::{create_credential, Credential, Status, URI};

// StatusList2021 revocation
// https://w3c-ccg.github.io/vc-status-list-2021/

pub const STATUS_LIST_2021_TYPE: &str = "StatusList2021";
pub const STATUS_LIST_2021_ENTRY_TYPE: &str = "StatusList2021Entry";

/// Number of 64-bit words in a revocation list.
pub const SIZE: usize = 2000;
/// Bits per word.
pub const SIZE_PER_INDEX: usize = 64;
/// Total number of addressable credentials per list.
pub const CAPACITY: usize = SIZE * SIZE_PER_INDEX;

/// Gzipped, base64-encoded form of a [RevocationList], as carried in the
/// `encodedList` property of a StatusList2021 credential.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EncodedList(pub String);

#[derive(ThisError, Debug)]
pub enum DecodeListError {
    #[error("Base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("Decompression: {0}")]
    Decompress(#[from] std::io::Error),
    #[error("Invalid list length: {0} bytes")]
    Length(usize),
}

#[derive(ThisError, Debug)]
pub enum EncodeListError {
    #[error("Compression: {0}")]
    Compress(#[from] std::io::Error),
}

/// Revocation bitmap of [CAPACITY] credentials.
///
/// Bit `i` set means credential `i` is revoked. Bits only ever go from
/// unset to set; un-revoking is not supported. Addressing is reversed at
/// the word level: index 0 lives in the highest-addressed word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevocationList {
    words: Vec<u64>,
}

impl Default for RevocationList {
    fn default() -> Self {
        Self::new()
    }
}

impl RevocationList {
    pub fn new() -> Self {
        Self {
            words: vec![0; SIZE],
        }
    }

    fn locate(index: usize) -> Result<(usize, u32), Error> {
        if index >= CAPACITY {
            return Err(Error::IndexOutOfRange(index));
        }
        let word = SIZE - 1 - index / SIZE_PER_INDEX;
        let bit = (index % SIZE_PER_INDEX) as u32;
        Ok((word, bit))
    }

    pub fn is_revoked(&self, index: usize) -> Result<bool, Error> {
        let (word, bit) = Self::locate(index)?;
        Ok(self.words[word] >> bit & 1 == 1)
    }

    /// Mark credential `index` as revoked. Idempotent.
    pub fn revoke(&mut self, index: usize) -> Result<(), Error> {
        let (word, bit) = Self::locate(index)?;
        self.words[word] |= 1 << bit;
        Ok(())
    }
}

impl TryFrom<&RevocationList> for EncodedList {
    type Error = EncodeListError;
    fn try_from(list: &RevocationList) -> Result<Self, Self::Error> {
        use flate2::{write::GzEncoder, Compression};
        use std::io::Write;
        let mut bytes = Vec::with_capacity(SIZE * 8);
        for word in &list.words {
            bytes.extend_from_slice(&word.to_le_bytes());
        }
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&bytes)?;
        Ok(EncodedList(base64::encode(encoder.finish()?)))
    }
}

impl TryFrom<&EncodedList> for RevocationList {
    type Error = DecodeListError;
    fn try_from(encoded_list: &EncodedList) -> Result<Self, Self::Error> {
        use flate2::bufread::GzDecoder;
        use std::io::Read;
        let bytes = base64::decode(&encoded_list.0)?;
        let mut data = Vec::new();
        GzDecoder::new(bytes.as_slice()).read_to_end(&mut data)?;
        if data.len() != SIZE * 8 {
            return Err(DecodeListError::Length(data.len()));
        }
        let mut words = Vec::with_capacity(SIZE);
        let mut word_bytes = [0u8; 8];
        for chunk in data.chunks_exact(8) {
            word_bytes.copy_from_slice(chunk);
            words.push(u64::from_le_bytes(word_bytes));
        }
        Ok(Self { words })
    }
}

/// Credential subject of a StatusList2021 credential.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct StatusList2021Subject {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<URI>,
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    pub encoded_list: EncodedList,
}

/// Transport for status list credentials.
///
/// Lists live at `{listUrl}/list.json`; updated lists are published to
/// `{listUrl}/statusList`.
#[async_trait]
pub trait StatusListFetcher: Sync {
    async fn get(&self, url: &str) -> Result<Credential, Error>;
    async fn post(&self, url: &str, credential: &Credential) -> Result<(), Error>;
}

/// HTTP status list transport.
pub struct HttpStatusListFetcher {
    client: reqwest::Client,
}

impl HttpStatusListFetcher {
    pub fn new() -> Result<Self, Error> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "User-Agent",
            reqwest::header::HeaderValue::from_static(crate::USER_AGENT),
        );
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|err| Error::FetchFailure(err.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl StatusListFetcher for HttpStatusListFetcher {
    async fn get(&self, url: &str) -> Result<Credential, Error> {
        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|err| Error::FetchFailure(err.to_string()))?
            .error_for_status()
            .map_err(|err| Error::FetchFailure(err.to_string()))?;
        response
            .json()
            .await
            .map_err(|err| Error::FetchFailure(err.to_string()))
    }

    async fn post(&self, url: &str, credential: &Credential) -> Result<(), Error> {
        self.client
            .post(url)
            .json(credential)
            .send()
            .await
            .map_err(|err| Error::PublishFailure(err.to_string()))?
            .error_for_status()
            .map_err(|err| Error::PublishFailure(err.to_string()))?;
        Ok(())
    }
}

/// Split a StatusList2021Entry id into the list URL and the credential's
/// index within the list.
fn split_status_id(id: &URI) -> Result<(&str, usize), Error> {
    let URI::String(id) = id;
    let (list_url, index) = id
        .split_once('#')
        .ok_or_else(|| Error::InvalidStatusId(id.clone()))?;
    let index = index
        .parse::<usize>()
        .map_err(|_| Error::InvalidStatusId(id.clone()))?;
    Ok((list_url, index))
}

fn status_list_entry(credential: &Credential) -> Option<&Status> {
    match &credential.credential_status {
        Some(status) if status.type_ == STATUS_LIST_2021_ENTRY_TYPE => Some(status),
        _ => None,
    }
}

fn status_list_subject(list_credential: &Credential) -> Result<StatusList2021Subject, Error> {
    let subject = serde_json::to_value(&list_credential.credential_subject)?;
    serde_json::from_value(subject).map_err(|_| Error::MissingEncodedList)
}

/// Revoke a credential in the status list named by its
/// `credentialStatus` entry, and publish the updated list as a new
/// StatusList2021 credential.
///
/// Returns `Ok(false)` without side effects when the credential carries
/// no StatusList2021Entry status, `Ok(true)` once the updated list has
/// been published. Transport and decoding failures surface as errors; a
/// failed publish leaves the remote list unchanged.
pub async fn revoke_status_list_2021(
    credential: &Credential,
    issuer_did: &str,
    subject_did: &str,
    fetcher: &dyn StatusListFetcher,
) -> Result<bool, Error> {
    let status = match status_list_entry(credential) {
        Some(status) => status,
        None => return Ok(false),
    };
    let (list_url, index) = split_status_id(&status.id)?;

    let list_credential = fetcher.get(&format!("{}/list.json", list_url)).await?;
    let subject = status_list_subject(&list_credential)?;
    let mut list = RevocationList::try_from(&subject.encoded_list)?;
    list.revoke(index)?;
    let encoded_list = EncodedList::try_from(&list)?;

    let mut claims = Map::new();
    claims.insert(
        "type".to_string(),
        serde_json::Value::String(STATUS_LIST_2021_TYPE.to_string()),
    );
    claims.insert(
        "purpose".to_string(),
        serde_json::Value::String(
            subject.purpose.unwrap_or_else(|| "revocation".to_string()),
        ),
    );
    claims.insert(
        "encodedList".to_string(),
        serde_json::Value::String(encoded_list.0),
    );
    let list_credential =
        create_credential(issuer_did, subject_did, claims, &[STATUS_LIST_2021_TYPE]);

    fetcher
        .post(&format!("{}/statusList", list_url), &list_credential)
        .await?;
    Ok(true)
}

/// Check a credential's revocation status against its published list.
///
/// `Ok(false)` when the credential carries no StatusList2021Entry
/// status.
pub async fn check_status(
    credential: &Credential,
    fetcher: &dyn StatusListFetcher,
) -> Result<bool, Error> {
    let status = match status_list_entry(credential) {
        Some(status) => status,
        None => return Ok(false),
    };
    let (list_url, index) = split_status_id(&status.id)?;
    let list_credential = fetcher.get(&format!("{}/list.json", list_url)).await?;
    let subject = status_list_subject(&list_credential)?;
    let list = RevocationList::try_from(&subject.encoded_list)?;
    list.is_revoked(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn revoke_and_query() {
        let mut list = RevocationList::new();
        assert!(!list.is_revoked(42).unwrap());
        list.revoke(42).unwrap();
        assert!(list.is_revoked(42).unwrap());
        assert!(!list.is_revoked(41).unwrap());
        assert!(!list.is_revoked(43).unwrap());

        // idempotent
        list.revoke(42).unwrap();
        assert!(list.is_revoked(42).unwrap());

        assert!(matches!(
            list.revoke(CAPACITY),
            Err(Error::IndexOutOfRange(_))
        ));
        assert!(matches!(
            list.is_revoked(CAPACITY),
            Err(Error::IndexOutOfRange(_))
        ));
    }

    #[test]
    fn word_addressing_is_reversed() {
        let mut list = RevocationList::new();
        list.revoke(0).unwrap();
        assert_eq!(list.words[SIZE - 1], 1);

        let mut list = RevocationList::new();
        list.revoke(CAPACITY - 1).unwrap();
        assert_eq!(list.words[0], 1 << 63);
    }

    #[test]
    fn serialize_parse_roundtrip() {
        let mut list = RevocationList::new();
        list.revoke(42).unwrap();
        list.revoke(127_999).unwrap();

        let encoded = EncodedList::try_from(&list).unwrap();
        // standard base64, not base64url
        assert!(!encoded.0.contains('-') && !encoded.0.contains('_'));

        let parsed = RevocationList::try_from(&encoded).unwrap();
        assert_eq!(parsed, list);
        assert!(parsed.is_revoked(42).unwrap());
        assert!(!parsed.is_revoked(41).unwrap());
        assert!(!parsed.is_revoked(43).unwrap());
    }

    #[test]
    fn parse_rejects_wrong_length() {
        use flate2::{write::GzEncoder, Compression};
        use std::io::Write;
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&[0u8; 100]).unwrap();
        let encoded = EncodedList(base64::encode(encoder.finish().unwrap()));
        assert!(matches!(
            RevocationList::try_from(&encoded),
            Err(DecodeListError::Length(100))
        ));
    }

    struct MemoryFetcher {
        lists: Mutex<Map<String, Credential>>,
        published: Mutex<Vec<(String, Credential)>>,
    }

    impl MemoryFetcher {
        fn new(list_url: &str, credential: Credential) -> Self {
            let mut lists = Map::new();
            lists.insert(format!("{}/list.json", list_url), credential);
            Self {
                lists: Mutex::new(lists),
                published: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl StatusListFetcher for MemoryFetcher {
        async fn get(&self, url: &str) -> Result<Credential, Error> {
            self.lists
                .lock()
                .unwrap()
                .get(url)
                .cloned()
                .ok_or_else(|| Error::FetchFailure(format!("not found: {}", url)))
        }

        async fn post(&self, url: &str, credential: &Credential) -> Result<(), Error> {
            self.published
                .lock()
                .unwrap()
                .push((url.to_string(), credential.clone()));
            Ok(())
        }
    }

    fn status_list_credential(list: &RevocationList) -> Credential {
        let encoded = EncodedList::try_from(list).unwrap();
        let mut claims = Map::new();
        claims.insert(
            "type".to_string(),
            serde_json::Value::String(STATUS_LIST_2021_TYPE.to_string()),
        );
        claims.insert(
            "purpose".to_string(),
            serde_json::Value::String("revocation".to_string()),
        );
        claims.insert(
            "encodedList".to_string(),
            serde_json::Value::String(encoded.0),
        );
        create_credential(
            "did:example:registry",
            "https://example.com/status/1",
            claims,
            &[STATUS_LIST_2021_TYPE],
        )
    }

    fn credential_with_status(index: usize) -> Credential {
        let mut credential = create_credential(
            "did:example:issuer",
            "did:example:holder",
            Map::new(),
            &[],
        );
        credential.credential_status = Some(Status {
            id: URI::String(format!("https://example.com/status/1#{}", index)),
            type_: STATUS_LIST_2021_ENTRY_TYPE.to_string(),
        });
        credential
    }

    #[async_std::test]
    async fn revoke_flow_republishes_list() {
        let list_url = "https://example.com/status/1";
        let fetcher = MemoryFetcher::new(list_url, status_list_credential(&RevocationList::new()));
        let credential = credential_with_status(42);

        let revoked =
            revoke_status_list_2021(&credential, "did:example:registry", list_url, &fetcher)
                .await
                .unwrap();
        assert!(revoked);

        let published = fetcher.published.lock().unwrap();
        let (url, list_credential) = &published[0];
        assert_eq!(url, "https://example.com/status/1/statusList");
        assert!(list_credential
            .type_
            .contains(&STATUS_LIST_2021_TYPE.to_string()));

        let subject = status_list_subject(list_credential).unwrap();
        assert_eq!(subject.purpose.as_deref(), Some("revocation"));
        let list = RevocationList::try_from(&subject.encoded_list).unwrap();
        assert!(list.is_revoked(42).unwrap());
        assert!(!list.is_revoked(41).unwrap());
    }

    #[async_std::test]
    async fn revoke_flow_ignores_foreign_status() {
        let list_url = "https://example.com/status/1";
        let fetcher = MemoryFetcher::new(list_url, status_list_credential(&RevocationList::new()));

        // no credentialStatus at all
        let plain = create_credential(
            "did:example:issuer",
            "did:example:holder",
            Map::new(),
            &[],
        );
        let revoked = revoke_status_list_2021(&plain, "did:example:registry", list_url, &fetcher)
            .await
            .unwrap();
        assert!(!revoked);

        // some other status scheme
        let mut other = plain.clone();
        other.credential_status = Some(Status {
            id: URI::String("https://example.com/status/1#7".to_string()),
            type_: "RevocationList2020Status".to_string(),
        });
        let revoked = revoke_status_list_2021(&other, "did:example:registry", list_url, &fetcher)
            .await
            .unwrap();
        assert!(!revoked);
        assert!(fetcher.published.lock().unwrap().is_empty());
    }

    #[async_std::test]
    async fn revoke_flow_surfaces_fetch_failure() {
        let fetcher = MemoryFetcher::new(
            "https://example.com/status/1",
            status_list_credential(&RevocationList::new()),
        );
        let mut credential = credential_with_status(7);
        credential.credential_status = Some(Status {
            id: URI::String("https://example.com/status/2#7".to_string()),
            type_: STATUS_LIST_2021_ENTRY_TYPE.to_string(),
        });
        assert!(matches!(
            revoke_status_list_2021(
                &credential,
                "did:example:registry",
                "https://example.com/status/2",
                &fetcher,
            )
            .await,
            Err(Error::FetchFailure(_))
        ));
    }

    #[async_std::test]
    async fn check_status_reads_published_bit() {
        let list_url = "https://example.com/status/1";
        let mut list = RevocationList::new();
        list.revoke(42).unwrap();
        let fetcher = MemoryFetcher::new(list_url, status_list_credential(&list));

        assert!(check_status(&credential_with_status(42), &fetcher)
            .await
            .unwrap());
        assert!(!check_status(&credential_with_status(41), &fetcher)
            .await
            .unwrap());
    }

    #[test]
    fn malformed_status_id() {
        assert!(matches!(
            split_status_id(&URI::String("https://example.com/status/1".to_string())),
            Err(Error::InvalidStatusId(_))
        ));
        assert!(matches!(
            split_status_id(&URI::String(
                "https://example.com/status/1#notanumber".to_string()
            )),
            Err(Error::InvalidStatusId(_))
        ));
        let status_uri = URI::String("https://example.com/status/1#42".to_string());
        let (url, index) = split_status_id(&status_uri).unwrap();
        assert_eq!(url, "https://example.com/status/1");
        assert_eq!(index, 42);
    }
}
