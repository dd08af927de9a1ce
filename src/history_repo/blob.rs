// BLOB version prefix helpers. [version: u8][payload].
// report_data: version 1 = wincode HealthReport.

pub(super) const REPORT_BLOB_VERSION: u8 = 1;

pub(super) fn with_version_prefix(version: u8, payload: Vec<u8>) -> Vec<u8> {
    let mut out = Vec::with_capacity(1 + payload.len());
    out.push(version);
    out.extend_from_slice(&payload);
    out
}

/// (version, payload), or None for an empty blob.
pub(super) fn split_version(bytes: &[u8]) -> Option<(u8, &[u8])> {
    bytes.split_first().map(|(v, rest)| (*v, rest))
}
