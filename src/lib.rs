//! # exonwalk
//!
//! Splice pattern analysis over exon annotation tables.
//!
//! ## Overview
//!
//! The input is a tab-separated table with one line per exon. Each line lists
//! the splice patterns (isoforms) that use the exon, as
//! `name[position/total]` tokens. From such a table the crate
//!
//! - **groups** patterns into connected components of exon sharing
//!   ([`group`]);
//! - **relates** patterns that follow each other in transcription direction
//!   without being grouped ([`relation`]);
//! - **walks** a structural-variant converted table exon by exon from every
//!   pattern start, flagging which downstream exons are new relationships and
//!   which are already explained ([`walk`]).
//!
//! ## Input format
//!
//! ```text
//! chrom start end strand exonId patternCount firstExonCount lastExonCount
//! isProtein patternList proteinId [fragmentId fragmentTotal svType
//! origChrom origStart origEnd origStrand]
//! ```
//!
//! Lines with fewer than ten fields are dropped. The walk additionally needs
//! the protein id column.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use exonwalk::pipeline::run_walk;
//! use exonwalk::walk::WalkOptions;
//! use exonwalk::Writer;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let run = run_walk("converted.bed", "original.bed", &WalkOptions::default())?;
//!     Writer::from_records(&run.reports, &mut std::io::stdout())?;
//!     Ok(())
//! }
//! ```
//!
//! ## Step by step
//!
//! ```rust
//! use exonwalk::group::Groups;
//! use exonwalk::relation::extract_relations;
//! use exonwalk::walk::{classify, report_all, WalkOptions};
//! use exonwalk::Reader;
//!
//! let table = "\
//! chr1\t100\t200\t+\te1\t1\t1\t0\t0\tA[1/2]\t*
//! chr1\t300\t400\t+\te2\t2\t1\t1\t0\tA[2/2],B[1/2]\t*
//! chr1\t500\t600\t+\te3\t1\t0\t1\t0\tB[2/2]\t*
//! ";
//! let exons = Reader::from_reader(std::io::Cursor::new(table))
//!     .unwrap()
//!     .read_exons()
//!     .unwrap();
//!
//! let groups = Groups::from_exons(&exons);
//! assert_eq!(groups.len(), 1);
//!
//! let relations = extract_relations(&exons, groups.lookup());
//! assert!(relations.is_empty());
//!
//! let options = WalkOptions::default();
//! let walks = classify(&exons, groups.lookup(), &relations, &options);
//! let reports = report_all(&walks, &exons, &options);
//! assert_eq!(reports[0].seed_id, "A_e1");
//! assert_eq!(reports[0].flags.bits(), 0x19);
//! ```
//!
//! ## Feature flags
//!
//! - `cli`: builds the `exonwalk` binary (`clap`, `simple_logger`)
//! - `compression` / `gzip`, `zstd`, `bz2`: compressed inputs, gzip outputs
//! - `mmap`: memory-mapped input (`memmap2`)
//! - `rayon`: parallel line parsing and seed walks

#![cfg_attr(doc, warn(missing_docs))]

pub mod group;
pub mod pattern;
pub mod pipeline;
pub mod reader;
pub mod record;
pub mod relation;
pub mod strand;
pub mod walk;
pub mod writer;

pub use group::{GroupLookup, Groups};
pub use reader::{Reader, ReaderBuilder, ReaderError, ReaderMode, ReaderResult};
pub use record::{ExonRecord, ExonSet};
pub use relation::RelationSet;
pub use strand::Strand;
pub use walk::{ExonFlags, WalkOptions};
pub use writer::{Writer, WriterError, WriterResult};

#[cfg(any(feature = "gzip", feature = "zstd", feature = "bz2"))]
pub use reader::Compression;
