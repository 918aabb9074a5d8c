use crate::DartError;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::{IntoParallelIterator, ParallelIterator};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info, trace, warn};

/// Stream the body of `response` into a new file at `path`, returning the number of bytes written.
///
/// The parent directory is created, as necessary. With `tui` enabled, a progress bar tracks
/// the body against its `Content-Length` (when the server sends one).
pub async fn save_response(
    mut response: reqwest::Response,
    path: &Path,
    tui: bool,
) -> Result<u64, DartError> {
    let file_size = response.content_length().unwrap_or(0);

    // ensure the directory exists
    if let Some(dir_path) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        trace!("checking directory path: {:?}", dir_path);
        tokio::fs::create_dir_all(dir_path).await?;
    }

    // progress bar
    let pb = if tui {
        let pb = ProgressBar::new(file_size).with_style(
            ProgressStyle::default_bar()
                .template(
                    "{msg} {spinner:.magenta}\n\
                    [{elapsed_precise:.magenta}] |{bar:40.cyan/blue}| {bytes}/{total_bytes} \
                    [Rate: {bytes_per_sec:.magenta}, ETA: {eta:.blue}]",
                )?
                .progress_chars("##-"),
        );
        pb.set_message(format!("downloading to {} ...", path.display()));
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    } else {
        ProgressBar::hidden()
    };

    // stream into `<name>.part`; only a complete body is renamed onto `path`
    let partial = part_path(path);
    let result = stream_body(&mut response, &partial, &pb).await;
    pb.finish_and_clear();

    let written = match result {
        Ok(written) => written,
        Err(err) => {
            error!("download to {} interrupted, error({err})", path.display());
            if let Err(err) = tokio::fs::remove_file(&partial).await {
                warn!("failed to remove {}, error({err})", partial.display());
            }
            return Err(err);
        }
    };
    tokio::fs::rename(&partial, path).await?;
    debug!("{written} bytes written to {}", path.display());

    Ok(written)
}

async fn stream_body(
    response: &mut reqwest::Response,
    path: &Path,
    pb: &ProgressBar,
) -> Result<u64, DartError> {
    let mut file = File::create(path).await?;
    let mut written = 0u64;
    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
        pb.inc(chunk.len() as u64);
    }
    file.flush().await?;
    Ok(written)
}

/// Sibling of `path` that an unfinished download is written to; e.g., `corpCode.zip.part`.
pub fn part_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    path.with_file_name(name)
}

/// Reads a `.json` file from `path`.
pub async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, DartError> {
    trace!("reading file path: {}", path.display());
    let file = tokio::fs::read(path).await?;
    trace!("file read; deserializing bytes ...");
    let data: T = serde_json::from_slice(&file)?;
    Ok(data)
}

/// Writes `data` to `path` as pretty-printed JSON, keeping non-ASCII text as-is.
pub async fn write_json<T: serde::Serialize>(data: &T, path: &Path) -> Result<(), DartError> {
    trace!("serializing json for {}", path.display());
    let bytes = serde_json::to_vec_pretty(data)?;
    if let Some(dir_path) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(dir_path).await?;
    }
    tokio::fs::write(path, bytes).await?;
    debug!("json written to {}", path.display());
    Ok(())
}

/// Unzip a `.zip` file (`zip_file`) to a target directory (`to_dir`).
///
/// `to_dir` is created, as necessary. Entries are extracted in parallel with [`rayon`], each
/// worker holding its own handle on the archive. Entries whose names would escape `to_dir`
/// are skipped.
///
/// [`rayon`]: https://docs.rs/rayon/latest/rayon/
pub async fn unzip(zip_file: &Path, to_dir: &Path, tui: bool) -> Result<(), DartError> {
    debug!("unzipping {} to {}", zip_file.display(), to_dir.display());

    let file = std::fs::File::open(zip_file)?;
    let archive = zip::ZipArchive::new(file).map_err(|err| {
        error!("failed to open zip file at {}, {}", zip_file.display(), err);
        err
    })?;
    let zip_length = archive.len();
    drop(archive);

    // progress bar
    let pb = if tui {
        let pb = ProgressBar::new(zip_length as u64).with_style(
            ProgressStyle::default_bar()
                .template(
                    "{msg} {spinner:.magenta}\n\
                    [{elapsed_precise:.magenta}] |{bar:40.cyan/blue}| {human_pos}/{human_len} files \
                    [Rate: {per_sec:.magenta}, ETA: {eta:.blue}]",
                )?
                .progress_chars("##-"),
        );
        pb.set_message("unzipping file ...");
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    } else {
        ProgressBar::hidden()
    };

    // ensure the target directory exists
    tokio::fs::create_dir_all(to_dir).await?;

    // parallel iteration across zipped files
    (0..zip_length).into_par_iter().try_for_each_init(
        || {
            std::fs::File::open(zip_file)
                .ok()
                .and_then(|file| zip::ZipArchive::new(file).ok())
        },
        |archive, i| -> Result<(), DartError> {
            let archive = archive.as_mut().ok_or_else(|| {
                std::io::Error::other(format!("failed to reopen {}", zip_file.display()))
            })?;
            let mut file = archive.by_index(i)?;

            let Some(name) = file.enclosed_name() else {
                warn!("skipping zip entry with unsafe path: {}", file.name());
                pb.inc(1);
                return Ok(());
            };
            let outpath = to_dir.join(name);

            if file.is_dir() {
                std::fs::create_dir_all(&outpath)?;
            } else {
                // if output directory does not exist, create it
                if let Some(outdir) = outpath.parent() {
                    std::fs::create_dir_all(outdir)?;
                }

                // extract the file
                let mut outfile = std::fs::File::create(&outpath)?;
                trace!("copying {} to {}", file.name(), outpath.display());
                std::io::copy(&mut file, &mut outfile)?;
            }
            pb.inc(1);
            Ok(())
        },
    )?;

    info!("{} unzipped to {}", zip_file.display(), to_dir.display());

    pb.finish_and_clear();

    Ok(())
}

/// Recursively collect the files under `dir` with extension `ext` (case-insensitive), sorted.
pub fn find_files(dir: &Path, ext: &str) -> Result<Vec<PathBuf>, DartError> {
    let mut found = Vec::new();
    let mut pending = vec![dir.to_path_buf()];
    while let Some(current) = pending.pop() {
        for entry in std::fs::read_dir(&current)? {
            let path = entry?.path();
            if path.is_dir() {
                pending.push(path);
            } else if path
                .extension()
                .and_then(|found| found.to_str())
                .is_some_and(|found| found.eq_ignore_ascii_case(ext))
            {
                found.push(path);
            }
        }
    }
    found.sort();
    Ok(found)
}

//////////////////////////////////////////////////////////////
// -- TESTS --
//////////////////////////////////////////////////////////////
