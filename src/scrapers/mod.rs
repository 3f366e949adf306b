//! Article scrapers.
//!
//! The user can point the tool at any news URL, so there is one generic
//! scraper rather than one per outlet:
//!
//! | Module | Method | Notes |
//! |--------|--------|-------|
//! | [`article`] | HTML scraping | Paragraph text of any page; browser User-Agent, 10s timeout |
//!
//! Pages that load but yield no usable text come back as `Ok(None)` so the
//! caller can tell "could not fetch" apart from "nothing to read".

pub mod article;
