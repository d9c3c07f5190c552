use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Tracker address written into new descriptors when none is given.
pub const DEFAULT_ANNOUNCE: &str = "http://localhost:8080/announce";

#[derive(Parser, Debug)]
#[command(author, version, about = "Create, inspect and verify single-file torrent descriptors", long_about = None)]
pub struct Args {
    /// Directory holding descriptor files and the index
    #[arg(short, long, global = true, env = "TMETA_DEST")]
    pub dest: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create (or refresh) the descriptor for a file and record it in the index
    Create {
        /// File to describe
        path: PathBuf,

        /// Announce URL stored in the descriptor
        #[arg(short, long, env = "TMETA_ANNOUNCE", default_value = DEFAULT_ANNOUNCE)]
        announce: String,

        /// Bytes per piece
        #[arg(short, long, env = "TMETA_PIECE_LENGTH", default_value_t = torrent_meta::DEFAULT_PIECE_LENGTH)]
        piece_length: u64,
    },

    /// List every descriptor recorded in the index
    List {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the contents of a descriptor file
    Show {
        /// Descriptor file
        torrent: PathBuf,

        /// Also print every piece hash
        #[arg(long)]
        pieces: bool,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Read and verify a single piece
    ReadPiece {
        /// Descriptor file
        torrent: PathBuf,

        /// Zero-based piece index
        index: usize,

        /// Source file (defaults to the name stored in the descriptor)
        #[arg(short, long)]
        source: Option<PathBuf>,

        /// Write the verified piece bytes here
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Verify every piece of a source file against a descriptor
    Verify {
        /// Descriptor file
        torrent: PathBuf,

        /// Source file (defaults to the name stored in the descriptor)
        #[arg(short, long)]
        source: Option<PathBuf>,
    },

    /// Read every verified piece from a source and merge them into a new file
    Rebuild {
        /// Descriptor file
        torrent: PathBuf,

        /// Source file (defaults to the name stored in the descriptor)
        #[arg(short, long)]
        source: Option<PathBuf>,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Split a file into pieces and merge them back into `<stem>-test<.ext>`
    SplitMerge {
        /// File to split
        path: PathBuf,

        /// Bytes per piece
        #[arg(short, long, env = "TMETA_PIECE_LENGTH", default_value_t = torrent_meta::DEFAULT_PIECE_LENGTH)]
        piece_length: u64,
    },
}
