//! Command handlers. Core operations are blocking file I/O, so they run on
//! tokio's blocking pool.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task;
use torrent_meta::{
    DescriptorIndex, PieceStatus, TorrentDescriptor, TorrentError, check_piece, check_pieces,
    merge, read_piece, sha1_digest, split_file, track_descriptor,
};
use tracing::{info, warn};

use crate::cli::{Args, Command};
use crate::index::JsonIndex;
use crate::storage::Storage;

pub type CmdResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Upper bound on piece reads in flight at once.
const MAX_PARALLEL_READS: usize = 8;

/// Summary of a descriptor, as printed by `show`.
#[derive(Debug, Serialize)]
pub struct DescriptorSummary {
    pub name: String,
    pub announce: String,
    pub info_hash: String,
    pub length: u64,
    pub piece_length: u64,
    pub num_pieces: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pieces: Option<Vec<String>>,
}

impl DescriptorSummary {
    pub fn new(t: &TorrentDescriptor, with_pieces: bool) -> Self {
        Self {
            name: t.name().to_string(),
            announce: t.announce().to_string(),
            info_hash: t.info_hash_hex(),
            length: t.length(),
            piece_length: t.piece_length(),
            num_pieces: t.num_pieces(),
            pieces: with_pieces.then(|| t.piece_hashes().iter().map(hex::encode).collect()),
        }
    }
}

#[derive(Debug, Serialize)]
struct IndexEntry {
    source: PathBuf,
    torrent: PathBuf,
}

pub async fn run(args: Args) -> CmdResult<()> {
    match args.command {
        Command::Create {
            path,
            announce,
            piece_length,
        } => {
            let storage = Storage::new(args.dest).await?;
            let torrent_path = create(&storage, &path, announce, piece_length).await?;
            println!("{}", torrent_path.display());
        }
        Command::List { json } => {
            let storage = Storage::new(args.dest).await?;
            list(&storage, json).await?;
        }
        Command::Show {
            torrent,
            pieces,
            json,
        } => {
            let t = load(&torrent).await?;
            let summary = DescriptorSummary::new(&t, pieces);
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print_summary(&summary);
            }
        }
        Command::ReadPiece {
            torrent,
            index,
            source,
            output,
        } => {
            let t = Arc::new(load(&torrent).await?);
            let source = source_or_name(source, &t);
            let piece = read_one(t, source, index).await?;
            println!(
                "piece {}: {} bytes, sha1 {}",
                index,
                piece.len(),
                hex::encode(sha1_digest(&piece))
            );
            if let Some(output) = output {
                tokio::fs::write(&output, &piece).await?;
                println!("wrote {}", output.display());
            }
        }
        Command::Verify { torrent, source } => {
            let t = Arc::new(load(&torrent).await?);
            let source = source_or_name(source, &t);
            let statuses = verify(t, source).await?;
            let bad: Vec<usize> = statuses
                .iter()
                .enumerate()
                .filter(|(_, s)| **s != PieceStatus::Have)
                .map(|(i, _)| i)
                .collect();
            println!(
                "Found {}/{} pieces.",
                statuses.len() - bad.len(),
                statuses.len()
            );
            for i in &bad {
                println!("piece {}: {:?}", i, statuses[*i]);
            }
            if !bad.is_empty() {
                return Err(format!("{} pieces failed verification", bad.len()).into());
            }
        }
        Command::Rebuild {
            torrent,
            source,
            output,
        } => {
            let t = Arc::new(load(&torrent).await?);
            let source = source_or_name(source, &t);
            rebuild(t, source, output.clone()).await?;
            println!("rebuilt {}", output.display());
        }
        Command::SplitMerge { path, piece_length } => {
            let output = split_merge(path.clone(), piece_length).await?;
            println!(
                "Successfully split and merged file:\nOriginal: {}\nNew: {}",
                path.display(),
                output.display()
            );
        }
    }
    Ok(())
}

fn source_or_name(source: Option<PathBuf>, t: &TorrentDescriptor) -> PathBuf {
    source.unwrap_or_else(|| PathBuf::from(t.name()))
}

fn print_summary(summary: &DescriptorSummary) {
    println!("Name:         {}", summary.name);
    println!("Announce:     {}", summary.announce);
    println!("Info Hash:    {}", summary.info_hash);
    println!("Length:       {}", summary.length);
    println!("Piece Length: {}", summary.piece_length);
    println!("Pieces:       {}", summary.num_pieces);
    if let Some(pieces) = &summary.pieces {
        for (i, hash) in pieces.iter().enumerate() {
            println!("  {:>6} {}", i, hash);
        }
    }
}

pub async fn load(path: &Path) -> CmdResult<TorrentDescriptor> {
    let path = path.to_path_buf();
    let t = task::spawn_blocking(move || TorrentDescriptor::load(path)).await??;
    Ok(t)
}

/// Creates the descriptor for `source` in the storage directory and records
/// it in the index. Returns the descriptor path.
pub async fn create(
    storage: &Storage,
    source: &Path,
    announce: String,
    piece_length: u64,
) -> CmdResult<PathBuf> {
    let source = tokio::fs::canonicalize(source).await?;
    let dest = storage.dir().to_path_buf();
    let index_path = storage.index_path();
    let path = task::spawn_blocking(move || -> torrent_meta::Result<PathBuf> {
        let mut index = JsonIndex::open(index_path)?;
        track_descriptor(&mut index, &source, &dest, &announce, piece_length)
    })
    .await??;
    Ok(path)
}

/// Prints every indexed descriptor.
pub async fn list(storage: &Storage, json: bool) -> CmdResult<()> {
    let index_path = storage.index_path();
    let entries = task::spawn_blocking(move || JsonIndex::open(index_path).map(|i| i.all())).await??;

    if json {
        let entries: Vec<IndexEntry> = entries
            .into_iter()
            .map(|(source, torrent)| IndexEntry { source, torrent })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    println!("List of all torrent files in {}:", storage.get_torrent_dir_str());
    for (source, torrent) in entries {
        println!("Torrent File: {} ({})", torrent.display(), source.display());
    }
    Ok(())
}

pub async fn read_one(t: Arc<TorrentDescriptor>, source: PathBuf, index: usize) -> CmdResult<Vec<u8>> {
    let piece = task::spawn_blocking(move || read_piece(&t, &source, index)).await??;
    Ok(piece)
}

/// Checks every piece of `source`, several pieces at a time.
pub async fn verify(t: Arc<TorrentDescriptor>, source: PathBuf) -> CmdResult<Vec<PieceStatus>> {
    let semaphore = Arc::new(Semaphore::new(MAX_PARALLEL_READS));
    let mut handles = Vec::with_capacity(t.num_pieces());
    for index in 0..t.num_pieces() {
        let permit = semaphore.clone().acquire_owned().await?;
        let t = t.clone();
        let source = source.clone();
        handles.push(task::spawn_blocking(move || {
            let _permit = permit;
            check_piece(&t, &source, index)
        }));
    }

    let mut statuses = Vec::with_capacity(handles.len());
    for handle in handles {
        statuses.push(handle.await??);
    }
    Ok(statuses)
}

/// Reads and verifies every piece of `source`, then merges them into `output`.
///
/// Any failed read aborts before `output` is touched.
pub async fn rebuild(t: Arc<TorrentDescriptor>, source: PathBuf, output: PathBuf) -> CmdResult<()> {
    let semaphore = Arc::new(Semaphore::new(MAX_PARALLEL_READS));
    let mut handles = Vec::with_capacity(t.num_pieces());
    for index in 0..t.num_pieces() {
        let permit = semaphore.clone().acquire_owned().await?;
        let t = t.clone();
        let source = source.clone();
        handles.push(task::spawn_blocking(move || {
            let _permit = permit;
            read_piece(&t, &source, index).map(|piece| (index, piece))
        }));
    }

    let mut pieces = HashMap::with_capacity(handles.len());
    for handle in handles {
        match handle.await? {
            Ok((index, piece)) => {
                pieces.insert(index, piece);
            }
            Err(e) => {
                warn!(error = %e, "aborting rebuild");
                return Err(e.into());
            }
        }
    }

    task::spawn_blocking(move || merge(&t, &output, &pieces)).await??;
    Ok(())
}

/// `<stem>-test<.ext>` next to `path`.
pub fn split_merge_output(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{}-test.{}", stem, ext.to_string_lossy()),
        None => format!("{}-test", stem),
    };
    path.with_file_name(name)
}

/// Splits `path` into pieces, merges them back into a sibling file and checks
/// that every piece of the copy verifies. Returns the copy's path.
pub async fn split_merge(path: PathBuf, piece_length: u64) -> CmdResult<PathBuf> {
    let output = split_merge_output(&path);
    let out = output.clone();
    let statuses = task::spawn_blocking(move || -> torrent_meta::Result<Vec<PieceStatus>> {
        let t = TorrentDescriptor::create(&path, crate::cli::DEFAULT_ANNOUNCE, piece_length)?;
        let mut pieces = HashMap::with_capacity(t.num_pieces());
        let chunk_len = usize::try_from(piece_length).map_err(|_| {
            TorrentError::InvalidArgument(format!("piece length {} is too large", piece_length))
        })?;
        for (index, piece) in split_file(&path, chunk_len)?.enumerate() {
            pieces.insert(index, piece?);
        }
        merge(&t, &out, &pieces)?;
        check_pieces(&t, &out)
    })
    .await??;

    if let Some(index) = statuses.iter().position(|s| *s != PieceStatus::Have) {
        return Err(format!("merged copy failed verification at piece {}", index).into());
    }
    info!(pieces = statuses.len(), "split and merge verified");
    Ok(output)
}
