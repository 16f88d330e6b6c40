use crate::{Asset, ErrorKind, Release, RelgetBuilder, RelgetError};
use anyhow::Result;
use mockito::{Matcher, Mock, Server, ServerGuard};
use reqwest::header::ACCEPT;
use std::{fs, path::Path};
use tempfile::tempdir;
use test_log::test;

const LATEST_PATH: &str = "/repos/owner/tool/releases/latest";

fn release_body(server: &ServerGuard, names: &[&str]) -> Result<String> {
    let assets = names
        .iter()
        .map(|name| Asset {
            name: (*name).to_string(),
            url: format!(
                "{}/owner/tool/releases/download/v1.0.0/{name}",
                server.url()
            ),
        })
        .collect();
    Ok(serde_json::to_string(&Release { assets })?)
}

async fn mock_latest(server: &mut ServerGuard, names: &[&str]) -> Result<Mock> {
    let body = release_body(server, names)?;
    Ok(server
        .mock("GET", LATEST_PATH)
        .match_header(ACCEPT.as_str(), "application/json")
        .with_status(reqwest::StatusCode::OK.as_u16() as usize)
        .with_body(body)
        .create_async()
        .await)
}

async fn mock_download(server: &mut ServerGuard, name: &str, expect: usize) -> Mock {
    server
        .mock(
            "GET",
            format!("/owner/tool/releases/download/v1.0.0/{name}").as_str(),
        )
        .with_status(200)
        .with_body(format!("content of {name}"))
        .expect(expect)
        .create_async()
        .await
}

fn dir_entries(dir: &Path) -> Result<Vec<String>> {
    let mut names = fs::read_dir(dir)?
        .map(|e| Ok(e?.file_name().to_string_lossy().into_owned()))
        .collect::<Result<Vec<_>>>()?;
    names.sort();
    Ok(names)
}

#[test(tokio::test)]
async fn downloads_only_matching_assets() -> Result<()> {
    let mut server = Server::new_async().await;
    let m_latest = mock_latest(&mut server, &["tool.tar.gz", "tool.zip", "README.md"]).await?;
    let m_tarball = mock_download(&mut server, "tool.tar.gz", 1).await;
    let m_zip = mock_download(&mut server, "tool.zip", 0).await;
    let m_readme = mock_download(&mut server, "README.md", 0).await;

    let td = tempdir()?;
    let url = server.url();
    let relget = RelgetBuilder::new()
        .repo("owner/tool")
        .matching(r".*\.tar\.gz$")
        .download_to(td.path())
        .api_base_url(&url)
        .build()?;
    let downloaded = relget.run().await?;

    assert_eq!(downloaded, vec![td.path().join("tool.tar.gz")]);
    assert_eq!(dir_entries(td.path())?, vec!["tool.tar.gz"]);
    assert_eq!(
        fs::read_to_string(td.path().join("tool.tar.gz"))?,
        "content of tool.tar.gz",
    );

    m_latest.assert_async().await;
    m_tarball.assert_async().await;
    m_zip.assert_async().await;
    m_readme.assert_async().await;

    Ok(())
}

#[test(tokio::test)]
async fn default_pattern_downloads_everything() -> Result<()> {
    let mut server = Server::new_async().await;
    let m_latest = mock_latest(&mut server, &["tool-linux"]).await?;
    let m_download = mock_download(&mut server, "tool-linux", 1).await;

    let td = tempdir()?;
    let url = server.url();
    let relget = RelgetBuilder::new()
        .repo("https://github.com/owner/tool/releases")
        .download_to(td.path())
        .api_base_url(&url)
        .build()?;
    let downloaded = relget.run().await?;

    assert_eq!(downloaded, vec![td.path().join("tool-linux")]);
    assert_eq!(
        fs::read_to_string(td.path().join("tool-linux"))?,
        "content of tool-linux",
    );

    m_latest.assert_async().await;
    m_download.assert_async().await;

    Ok(())
}

#[test(tokio::test)]
async fn release_without_assets_is_an_error() -> Result<()> {
    let mut server = Server::new_async().await;
    let m_latest = mock_latest(&mut server, &[]).await?;
    let m_download = server
        .mock("GET", Matcher::Regex("^/owner/".to_string()))
        .expect(0)
        .create_async()
        .await;

    let td = tempdir()?;
    let url = server.url();
    let relget = RelgetBuilder::new()
        .repo("owner/tool")
        .download_to(td.path())
        .api_base_url(&url)
        .build()?;
    let err = relget.run().await.unwrap_err();

    match err.downcast_ref::<RelgetError>() {
        Some(RelgetError::NoAssets { repo, url }) => {
            assert_eq!(repo, "owner/tool");
            assert!(url.as_str().ends_with(LATEST_PATH), "{url}");
        }
        _ => panic!("expected a RelgetError::NoAssets but got {err:#}"),
    }
    assert!(dir_entries(td.path())?.is_empty());

    m_latest.assert_async().await;
    m_download.assert_async().await;

    Ok(())
}

#[test(tokio::test)]
async fn release_with_null_assets_is_an_error() -> Result<()> {
    let mut server = Server::new_async().await;
    let m_latest = server
        .mock("GET", LATEST_PATH)
        .with_status(200)
        .with_body(r#"{"tag_name": "v1.0.0", "assets": null}"#)
        .create_async()
        .await;

    let td = tempdir()?;
    let url = server.url();
    let relget = RelgetBuilder::new()
        .repo("owner/tool")
        .download_to(td.path())
        .api_base_url(&url)
        .build()?;
    let err = relget.run().await.unwrap_err();

    assert!(
        matches!(
            err.downcast_ref::<RelgetError>(),
            Some(RelgetError::NoAssets { .. })
        ),
        "expected a RelgetError::NoAssets but got {err:#}",
    );
    assert!(dir_entries(td.path())?.is_empty());

    m_latest.assert_async().await;

    Ok(())
}

#[test(tokio::test)]
async fn bad_urls_on_skipped_assets_are_ignored() -> Result<()> {
    let mut server = Server::new_async().await;
    let body = format!(
        r#"{{"assets": [
          {{"name": "notes.txt", "browser_download_url": "::not a url::"}},
          {{"name": "checksums.txt"}},
          {{"name": "tool.tar.gz", "browser_download_url": "{}/owner/tool/releases/download/v1.0.0/tool.tar.gz"}}
        ]}}"#,
        server.url(),
    );
    let m_latest = server
        .mock("GET", LATEST_PATH)
        .with_status(200)
        .with_body(body)
        .create_async()
        .await;
    let m_tarball = mock_download(&mut server, "tool.tar.gz", 1).await;

    let td = tempdir()?;
    let url = server.url();
    let relget = RelgetBuilder::new()
        .repo("owner/tool")
        .matching(r"\.tar\.gz$")
        .download_to(td.path())
        .api_base_url(&url)
        .build()?;
    let downloaded = relget.run().await?;

    assert_eq!(downloaded, vec![td.path().join("tool.tar.gz")]);
    assert_eq!(dir_entries(td.path())?, vec!["tool.tar.gz"]);

    m_latest.assert_async().await;
    m_tarball.assert_async().await;

    Ok(())
}

#[test(tokio::test)]
async fn asset_names_cannot_escape_the_download_dir() -> Result<()> {
    let mut server = Server::new_async().await;
    let m_latest = mock_latest(&mut server, &["../escaped"]).await?;
    let m_download = server
        .mock("GET", Matcher::Regex("^/owner/".to_string()))
        .expect(0)
        .create_async()
        .await;

    let td = tempdir()?;
    let dest = td.path().join("dest");
    fs::create_dir(&dest)?;
    let url = server.url();
    let relget = RelgetBuilder::new()
        .repo("owner/tool")
        .download_to(&dest)
        .api_base_url(&url)
        .build()?;
    let err = relget.run().await.unwrap_err();

    assert_eq!(
        err.downcast_ref::<RelgetError>().map(RelgetError::kind),
        Some(ErrorKind::Download),
    );
    assert_eq!(dir_entries(td.path())?, vec!["dest"]);
    assert!(dir_entries(&dest)?.is_empty());

    m_latest.assert_async().await;
    m_download.assert_async().await;

    Ok(())
}

#[test(tokio::test)]
async fn unwritable_download_dir_is_an_error() -> Result<()> {
    let mut server = Server::new_async().await;
    let m_latest = mock_latest(&mut server, &["tool.zip", "tool.tar.gz"]).await?;
    let m_zip = mock_download(&mut server, "tool.zip", 0).await;
    let m_tarball = mock_download(&mut server, "tool.tar.gz", 0).await;

    let td = tempdir()?;
    let missing = td.path().join("no").join("such").join("dir");
    let url = server.url();
    let relget = RelgetBuilder::new()
        .repo("owner/tool")
        .download_to(&missing)
        .api_base_url(&url)
        .build()?;
    let err = relget.run().await.unwrap_err();

    let relget_err = err
        .downcast_ref::<RelgetError>()
        .expect("error is a RelgetError");
    assert_eq!(relget_err.kind(), ErrorKind::Download);
    assert!(
        err.to_string().contains("failed to create file at"),
        "{err}",
    );
    assert!(dir_entries(td.path())?.is_empty());

    m_latest.assert_async().await;
    m_zip.assert_async().await;
    m_tarball.assert_async().await;

    Ok(())
}

#[test(tokio::test)]
async fn missing_repo_is_an_error() -> Result<()> {
    let mut server = Server::new_async().await;
    let m = server
        .mock("GET", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let url = server.url();
    let err = RelgetBuilder::new()
        .api_base_url(&url)
        .build()
        .unwrap_err();
    assert_eq!(
        err.downcast_ref::<RelgetError>().map(RelgetError::kind),
        Some(ErrorKind::Configuration),
    );

    m.assert_async().await;

    Ok(())
}

#[test(tokio::test)]
async fn unknown_repo_is_a_fetch_error() -> Result<()> {
    let mut server = Server::new_async().await;
    let m = server
        .mock("GET", LATEST_PATH)
        .with_status(404)
        .with_body(r#"{"message": "Not Found"}"#)
        .create_async()
        .await;

    let td = tempdir()?;
    let url = server.url();
    let relget = RelgetBuilder::new()
        .repo("owner/tool")
        .download_to(td.path())
        .api_base_url(&url)
        .build()?;
    let err = relget.run().await.unwrap_err();
    assert_eq!(
        err.downcast_ref::<RelgetError>().map(RelgetError::kind),
        Some(ErrorKind::Fetch),
    );
    assert!(dir_entries(td.path())?.is_empty());

    m.assert_async().await;

    Ok(())
}

#[test(tokio::test)]
async fn include_draft_still_uses_latest_release() -> Result<()> {
    let mut server = Server::new_async().await;
    let m_latest = mock_latest(&mut server, &["tool-linux"]).await?;
    let m_list = server
        .mock("GET", "/repos/owner/tool/releases")
        .expect(0)
        .create_async()
        .await;

    let url = server.url();
    let td = tempdir()?;
    let relget = RelgetBuilder::new()
        .repo("owner/tool")
        .include_draft(true)
        .download_to(td.path())
        .api_base_url(&url)
        .build()?;
    let release = relget.fetch_release().await?;
    assert_eq!(
        release
            .assets
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>(),
        vec!["tool-linux"],
    );

    m_latest.assert_async().await;
    m_list.assert_async().await;

    Ok(())
}

#[test(tokio::test)]
async fn requests_send_a_user_agent() -> Result<()> {
    let mut server = Server::new_async().await;
    let m = server
        .mock("GET", LATEST_PATH)
        .match_header(
            "User-Agent",
            format!("relget version {}", crate::VERSION).as_str(),
        )
        .with_status(200)
        .with_body(r#"{"assets": []}"#)
        .create_async()
        .await;

    let url = server.url();
    let relget = RelgetBuilder::new()
        .repo("owner/tool")
        .download_to(".")
        .api_base_url(&url)
        .build()?;
    relget.fetch_release().await?;

    m.assert_async().await;

    Ok(())
}
