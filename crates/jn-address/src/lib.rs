//! Address resolution for `jn` resource references.
//!
//! A reference is the string a user types where `jn` expects a source or a
//! destination. [`resolve`] classifies it into exactly one [`AddressKind`]
//! and extracts the pieces later stages need: the path or locator, an
//! explicit `~format` override, format parameters, a compression codec, and
//! profile coordinates.
//!
//! | reference                       | kind          |
//! |---------------------------------|---------------|
//! | `-`                             | `StdStream`   |
//! | `data.csv`, `data.txt~csv`      | `LocalFile`   |
//! | `https://host/data.json`        | `Remote`      |
//! | `@gmail/inbox?is=unread`        | `Profile`     |
//! | `logs/*.jsonl`                  | `Glob`        |
//!
//! Resolution is pure: no filesystem or network access happens here.
//!
//! # Example
//!
//! ```
//! use jn_address::{AddressKind, resolve};
//!
//! let address = resolve("report.txt~csv?delimiter=%3B")?;
//! assert_eq!(address.kind(), AddressKind::LocalFile);
//! assert_eq!(address.raw_path(), "report.txt");
//! assert_eq!(address.effective_format(), Some("csv"));
//! assert_eq!(address.format_params().get("delimiter").map(String::as_str), Some(";"));
//! # Ok::<(), jn_address::AddressError>(())
//! ```

mod address;
mod error;
mod parser;


pub use self::address::{Address, AddressKind, Compression, ProfileRef};
pub use self::error::AddressError;
pub use self::parser::resolve;
