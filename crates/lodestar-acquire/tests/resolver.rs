//! End-to-end resolution scenarios against a mock indexer and a recording backend.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use httpmock::prelude::*;
use lodestar_acquire::{
    AcquireError, AcquisitionResolver, FailureKind, FetchOptions, ReleaseRecord, ResolverOptions,
    SubmissionProtocol, TorrentFetcher, cancel_pair, info_hash_from_torrent,
};
use lodestar_test_support::fixtures::{OTHER, SAMPLE, magnet_for};
use lodestar_test_support::mocks::{RecordingBackend, Reply};

const HEX: &str = "abcdef0123456789abcdef0123456789abcdef01";

fn resolver_with(backend: Arc<RecordingBackend>, max_redirects: u8) -> Result<AcquisitionResolver> {
    let fetcher = TorrentFetcher::new(&FetchOptions {
        timeout: Duration::from_secs(5),
        max_redirects,
        ..FetchOptions::default()
    })?;
    Ok(AcquisitionResolver::new(backend, fetcher))
}

async fn wait_for_submission(backend: &RecordingBackend) -> Result<()> {
    tokio::time::timeout(Duration::from_secs(5), async {
        while backend.submissions().is_empty() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await?;
    Ok(())
}

#[tokio::test]
async fn magnet_release_with_matching_backend_hash_has_no_warning() -> Result<()> {
    let backend = Arc::new(
        RecordingBackend::new().with_magnet_reply(Reply::Report(HEX.to_string())),
    );
    let release = ReleaseRecord::new(
        "Show.S01E01",
        format!("magnet:?xt=urn:btih:{}", HEX.to_ascii_uppercase()),
    );

    let resolved = resolver_with(backend.clone(), 5)?.resolve(&release).await?;

    assert_eq!(resolved.info_hash, HEX);
    assert_eq!(resolved.protocol, SubmissionProtocol::Magnet);
    assert!(resolved.warning.is_none());
    assert_eq!(backend.submissions().len(), 1);
    Ok(())
}

#[tokio::test]
async fn magnet_release_without_backend_hash_uses_parsed_hash() -> Result<()> {
    let backend = Arc::new(RecordingBackend::new().with_magnet_reply(Reply::Silent));
    let release = ReleaseRecord::new("Show.S01E01", magnet_for(HEX, Some("Show.S01E01")));

    let resolved = resolver_with(backend, 5)?.resolve(&release).await?;

    assert_eq!(resolved.info_hash, HEX);
    assert_eq!(resolved.local_hash.as_str(), HEX);
    Ok(())
}

#[tokio::test]
async fn torrent_hash_is_computed_from_fetched_bytes() -> Result<()> {
    let server = MockServer::start_async().await;
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/download/1")
            .header("accept", "application/x-bittorrent");
        then.status(200).body(SAMPLE.bytes);
    });
    let backend = Arc::new(RecordingBackend::new().with_file_reply(Reply::Silent));
    let release = ReleaseRecord::new("Sample Release", server.url("/download/1"));

    let resolved = resolver_with(backend.clone(), 5)?.resolve(&release).await?;

    mock.assert();
    assert_eq!(resolved.info_hash, SAMPLE.info_hash);
    assert_eq!(resolved.protocol, SubmissionProtocol::TorrentFile);
    let files = backend.submissions_for(SubmissionProtocol::TorrentFile);
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].info_hash, SAMPLE.info_hash);
    assert_eq!(files[0].target, "Sample Release.torrent");
    Ok(())
}

#[test]
fn identical_bytes_hash_identically() -> Result<()> {
    let first = info_hash_from_torrent(OTHER.bytes)?;
    let second = info_hash_from_torrent(&OTHER.bytes.to_vec())?;
    assert_eq!(first, second);
    assert_eq!(first.as_str(), OTHER.info_hash);
    Ok(())
}

#[tokio::test]
async fn redirect_chain_resolves_with_final_bytes() -> Result<()> {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(GET).path("/r/1");
        then.status(301).header("Location", "/r/2");
    });
    server.mock(|when, then| {
        when.method(GET).path("/r/2");
        then.status(307).header("Location", "/files/final.torrent");
    });
    server.mock(|when, then| {
        when.method(GET).path("/files/final.torrent");
        then.status(200).body(OTHER.bytes);
    });
    let backend = Arc::new(RecordingBackend::new());
    let release = ReleaseRecord::new("Other", server.url("/r/1"));

    let resolved = resolver_with(backend, 5)?.resolve(&release).await?;

    assert_eq!(resolved.info_hash, OTHER.info_hash);
    assert_eq!(resolved.locator, server.url("/files/final.torrent"));
    Ok(())
}

#[tokio::test]
async fn redirect_chain_over_the_cap_is_a_protocol_error() -> Result<()> {
    let server = MockServer::start_async().await;
    for hop in 0..4 {
        let from = format!("/hop/{hop}");
        let to = format!("/hop/{}", hop + 1);
        server.mock(move |when, then| {
            when.method(GET).path(from.as_str());
            then.status(302).header("Location", to.as_str());
        });
    }
    let backend = Arc::new(RecordingBackend::new());
    let release = ReleaseRecord::new("Deep", server.url("/hop/0"));

    let err = resolver_with(backend.clone(), 2)?
        .resolve(&release)
        .await
        .expect_err("hop cap exceeded");

    assert_eq!(err.kind(), FailureKind::ProtocolError);
    assert!(backend.submissions().is_empty());
    Ok(())
}

#[tokio::test]
async fn redirect_to_magnet_switches_to_magnet_path() -> Result<()> {
    let server = MockServer::start_async().await;
    let mock = server.mock(|when, then| {
        when.method(GET).path("/ep2.torrent");
        then.status(302)
            .header("Location", "magnet:?xt=urn:btih:111222");
    });
    let backend = Arc::new(RecordingBackend::new());
    let release = ReleaseRecord::new("Show.S01E02", server.url("/ep2.torrent"));

    let resolved = resolver_with(backend.clone(), 5)?.resolve(&release).await?;

    assert_eq!(mock.hits(), 1);
    assert_eq!(resolved.protocol, SubmissionProtocol::Magnet);
    assert_eq!(resolved.locator, "magnet:?xt=urn:btih:111222");
    let magnets = backend.submissions_for(SubmissionProtocol::Magnet);
    assert_eq!(magnets.len(), 1);
    assert_eq!(magnets[0].info_hash, "111222");
    assert!(backend.submissions_for(SubmissionProtocol::TorrentFile).is_empty());
    Ok(())
}

#[tokio::test]
async fn redirect_to_magnet_does_not_return_to_http() -> Result<()> {
    let server = MockServer::start_async().await;
    let mock = server.mock(|when, then| {
        when.method(GET).path("/ep3.torrent");
        then.status(302)
            .header("Location", "magnet:?xt=urn:btih:111222");
    });
    let backend = Arc::new(RecordingBackend::new().with_magnet_reply(Reply::Unsupported));
    let release = ReleaseRecord::new("Show.S01E03", server.url("/ep3.torrent"));

    let err = resolver_with(backend, 5)?
        .resolve(&release)
        .await
        .expect_err("no magnet support");

    assert_eq!(err.kind(), FailureKind::UnsupportedProtocol);
    assert_eq!(mock.hits(), 1);
    Ok(())
}

#[tokio::test]
async fn redirect_without_location_is_a_protocol_error() -> Result<()> {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(GET).path("/bad");
        then.status(302);
    });
    let release = ReleaseRecord::new("Bad", server.url("/bad"));

    let err = resolver_with(Arc::new(RecordingBackend::new()), 5)?
        .resolve(&release)
        .await
        .expect_err("protocol error");

    assert!(matches!(err, AcquireError::Protocol { .. }));
    assert_eq!(err.kind(), FailureKind::ProtocolError);
    Ok(())
}

#[tokio::test]
async fn mismatched_backend_hash_succeeds_with_one_warning() -> Result<()> {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(GET).path("/t/9");
        then.status(200).body(SAMPLE.bytes);
    });
    let backend = Arc::new(
        RecordingBackend::new().with_file_reply(Reply::Report(OTHER.info_hash.to_string())),
    );
    let release = ReleaseRecord::new("Sample", server.url("/t/9"));

    let resolved = resolver_with(backend, 5)?.resolve(&release).await?;

    assert_eq!(resolved.info_hash, OTHER.info_hash);
    let warning = resolved.warning.expect("warning attached");
    assert_eq!(warning.expected.as_str(), SAMPLE.info_hash);
    assert_eq!(warning.reported, OTHER.info_hash);
    Ok(())
}

#[tokio::test]
async fn malformed_magnet_falls_back_to_http() -> Result<()> {
    let server = MockServer::start_async().await;
    let mock = server.mock(|when, then| {
        when.method(GET).path("/t/10");
        then.status(200).body(SAMPLE.bytes);
    });
    let backend = Arc::new(RecordingBackend::new());
    let release = ReleaseRecord::new("Sample", server.url("/t/10"))
        .with_magnet("magnet:?xt=urn:btih:not-a-hash");

    let resolved = resolver_with(backend.clone(), 5)?.resolve(&release).await?;

    mock.assert();
    assert_eq!(resolved.protocol, SubmissionProtocol::TorrentFile);
    assert!(backend.submissions_for(SubmissionProtocol::Magnet).is_empty());
    Ok(())
}

#[tokio::test]
async fn backend_failure_on_magnet_path_does_not_fall_back() -> Result<()> {
    let server = MockServer::start_async().await;
    let mock = server.mock(|when, then| {
        when.method(GET).path("/t/11");
        then.status(200).body(SAMPLE.bytes);
    });
    let backend = Arc::new(RecordingBackend::new().with_magnet_reply(Reply::Fail("daemon offline")));
    let release = ReleaseRecord::new("Sample", server.url("/t/11")).with_magnet(magnet_for(HEX, None));

    let err = resolver_with(backend, 5)?
        .resolve(&release)
        .await
        .expect_err("submission failure");

    assert_eq!(err.kind(), FailureKind::SubmissionFailed);
    assert_eq!(mock.hits(), 0);
    Ok(())
}

#[tokio::test]
async fn http_failures_are_download_failed_with_retry_hint() -> Result<()> {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(GET).path("/t/12");
        then.status(429).header("Retry-After", "30");
    });
    let release = ReleaseRecord::new("Sample", server.url("/t/12"));

    let err = resolver_with(Arc::new(RecordingBackend::new()), 5)?
        .resolve(&release)
        .await
        .expect_err("rate limited");

    assert_eq!(err.kind(), FailureKind::DownloadFailed);
    assert_eq!(err.retry_after(), Some(Duration::from_secs(30)));
    Ok(())
}

#[tokio::test]
async fn file_submission_failure_is_download_failed() -> Result<()> {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(GET).path("/t/13");
        then.status(200).body(SAMPLE.bytes);
    });
    let backend = Arc::new(RecordingBackend::new().with_file_reply(Reply::Fail("disk full")));
    let release = ReleaseRecord::new("Sample", server.url("/t/13"));

    let err = resolver_with(backend, 5)?
        .resolve(&release)
        .await
        .expect_err("submission failure");

    match err {
        AcquireError::DownloadFailed { title, source } => {
            assert_eq!(title, "Sample");
            assert_eq!(source.kind(), FailureKind::SubmissionFailed);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn release_without_locators_fails_before_network() -> Result<()> {
    let backend = Arc::new(RecordingBackend::new());
    let release = ReleaseRecord::new("Nothing", "  ");

    let err = resolver_with(backend.clone(), 5)?
        .resolve(&release)
        .await
        .expect_err("no locator");

    assert_eq!(err.kind(), FailureKind::NoUsableLocator);
    assert!(backend.submissions().is_empty());
    Ok(())
}

#[tokio::test]
async fn prefer_torrent_file_tries_http_first() -> Result<()> {
    let server = MockServer::start_async().await;
    let mock = server.mock(|when, then| {
        when.method(GET).path("/t/14");
        then.status(200).body(SAMPLE.bytes);
    });
    let backend = Arc::new(RecordingBackend::new());
    let release = ReleaseRecord::new("Sample", server.url("/t/14")).with_magnet(magnet_for(HEX, None));

    let resolved = resolver_with(backend.clone(), 5)?
        .with_options(ResolverOptions {
            prefer_torrent_file: true,
        })
        .resolve(&release)
        .await?;

    mock.assert();
    assert_eq!(resolved.protocol, SubmissionProtocol::TorrentFile);
    assert!(backend.submissions_for(SubmissionProtocol::Magnet).is_empty());
    Ok(())
}

#[tokio::test]
async fn cancellation_aborts_a_slow_fetch() -> Result<()> {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(GET).path("/slow");
        then.status(200)
            .delay(Duration::from_secs(3))
            .body(SAMPLE.bytes);
    });
    let backend = Arc::new(RecordingBackend::new());
    let resolver = resolver_with(backend.clone(), 5)?;
    let release = ReleaseRecord::new("Slow", server.url("/slow"));
    let (handle, signal) = cancel_pair();

    let task = tokio::spawn(async move { resolver.resolve_with_cancel(&release, &signal).await });
    tokio::time::sleep(Duration::from_millis(100)).await;
    handle.cancel();

    let err = tokio::time::timeout(Duration::from_secs(2), task)
        .await??
        .expect_err("cancelled");
    assert_eq!(err.kind(), FailureKind::Cancelled);
    assert!(backend.submissions().is_empty());
    Ok(())
}

#[tokio::test]
async fn cancellation_aborts_a_stalled_magnet_submission() -> Result<()> {
    let backend = Arc::new(
        RecordingBackend::new().with_magnet_reply(Reply::Stall(Duration::from_secs(30))),
    );
    let resolver = resolver_with(backend.clone(), 5)?;
    let release = ReleaseRecord::new("Stalled", magnet_for(SAMPLE.info_hash, None));
    let (handle, signal) = cancel_pair();

    let task = tokio::spawn(async move { resolver.resolve_with_cancel(&release, &signal).await });
    wait_for_submission(&backend).await?;
    handle.cancel();

    let err = tokio::time::timeout(Duration::from_secs(2), task)
        .await??
        .expect_err("cancelled");
    assert_eq!(err.kind(), FailureKind::Cancelled);
    assert_eq!(backend.submissions_for(SubmissionProtocol::Magnet).len(), 1);
    assert!(backend.submissions_for(SubmissionProtocol::TorrentFile).is_empty());
    Ok(())
}

#[tokio::test]
async fn cancellation_aborts_a_stalled_file_submission() -> Result<()> {
    let server = MockServer::start_async().await;
    let mock = server.mock(|when, then| {
        when.method(GET).path("/t/stalled");
        then.status(200).body(SAMPLE.bytes);
    });
    let backend = Arc::new(
        RecordingBackend::new().with_file_reply(Reply::Stall(Duration::from_secs(30))),
    );
    let resolver = resolver_with(backend.clone(), 5)?;
    let release = ReleaseRecord::new("Stalled", server.url("/t/stalled"));
    let (handle, signal) = cancel_pair();

    let task = tokio::spawn(async move { resolver.resolve_with_cancel(&release, &signal).await });
    wait_for_submission(&backend).await?;
    handle.cancel();

    let err = tokio::time::timeout(Duration::from_secs(2), task)
        .await??
        .expect_err("cancelled");
    assert_eq!(err.kind(), FailureKind::Cancelled);
    mock.assert();
    assert_eq!(backend.submissions_for(SubmissionProtocol::TorrentFile).len(), 1);
    Ok(())
}
