//! Report renderers for the `pkgsec` binary.
//!
//! - [`terminal`] — colored tables with a summary box; respects `--verbose` / `--quiet`.

pub mod terminal;
