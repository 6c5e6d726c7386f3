//! Torrent payloads whose info-hashes were computed outside this workspace.

/// A single-file torrent fixture.
#[derive(Debug, Clone, Copy)]
pub struct TorrentFixture {
    /// Complete `.torrent` payload.
    pub bytes: &'static [u8],
    /// Lowercase hex SHA-1 of the bencoded `info` dictionary.
    pub info_hash: &'static str,
}

/// Torrent for `sample.mkv` with an announce URL.
pub const SAMPLE: TorrentFixture = TorrentFixture {
    bytes: b"d8:announce31:http://tracker.example/announce4:infod6:lengthi1048576e4:name10:sample.mkv12:piece lengthi262144e6:pieces20:01234567890123456789ee",
    info_hash: "2bd39d8d19aee0034d51b64a92eef6d49a88ad0e",
};

/// Torrent for `other.mkv` without an announce URL.
pub const OTHER: TorrentFixture = TorrentFixture {
    bytes: b"d4:infod6:lengthi2048e4:name9:other.mkv12:piece lengthi16384e6:pieces20:abcdefghijabcdefghijee",
    info_hash: "91aadc41020a65a9623df31a1e666aa58758de4b",
};

/// Build a magnet locator for `info_hash` with an optional display name.
#[must_use]
pub fn magnet_for(info_hash: &str, display_name: Option<&str>) -> String {
    display_name.map_or_else(
        || format!("magnet:?xt=urn:btih:{info_hash}"),
        |name| format!("magnet:?xt=urn:btih:{info_hash}&dn={name}"),
    )
}
