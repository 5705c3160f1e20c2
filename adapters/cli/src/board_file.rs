use std::{
    error::Error,
    fmt, fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use tactics_core::{BoardSize, BoardSnapshot};
use tactics_system_designer::BoardStore;

/// Board layout persisted as pretty-printed JSON at a fixed path.
#[derive(Clone, Debug)]
pub(crate) struct FileBoardStore {
    path: PathBuf,
}

impl FileBoardStore {
    pub(crate) fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }
}

impl BoardStore for FileBoardStore {
    fn save(&mut self, snapshot: &BoardSnapshot) -> Result<()> {
        let json = serde_json::to_string_pretty(snapshot).context("failed to encode board")?;
        if let Some(parent) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::write(&self.path, json + "\n")
            .with_context(|| format!("failed to write board to {}", self.path.display()))?;
        tracing::info!(path = %self.path.display(), "board saved");
        Ok(())
    }

    fn load(&mut self) -> Result<BoardSnapshot> {
        let text = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read board from {}", self.path.display()))?;
        let snapshot = BoardSnapshot::from_json(&text)
            .with_context(|| format!("{} is not a board layout", self.path.display()))?;
        tracing::info!(path = %self.path.display(), "board read");
        Ok(snapshot)
    }
}

/// Board dimensions written as `WIDTHxHEIGHT` could not be parsed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct InvalidDimensions(String);

impl fmt::Display for InvalidDimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "could not parse board dimensions '{}', expected e.g. 3x3",
            self.0
        )
    }
}

impl Error for InvalidDimensions {}

/// Parses `WIDTHxHEIGHT`, rejecting zero-sized extents.
pub(crate) fn parse_dimensions(dimensions: &str) -> Result<BoardSize, InvalidDimensions> {
    let invalid = || InvalidDimensions(dimensions.to_owned());
    let (x, y) = dimensions.split_once(['x', 'X']).ok_or_else(invalid)?;
    let x = x.trim().parse::<u32>().map_err(|_| invalid())?;
    let y = y.trim().parse::<u32>().map_err(|_| invalid())?;
    if x == 0 || y == 0 {
        return Err(invalid());
    }
    Ok(BoardSize::new(x, y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tactics_core::{CellSnapshot, SurfaceSnapshot};

    #[test]
    fn dimensions_accept_either_separator_case() {
        assert_eq!(parse_dimensions("3x3"), Ok(BoardSize::new(3, 3)));
        assert_eq!(parse_dimensions(" 12 X 8 "), Ok(BoardSize::new(12, 8)));
    }

    #[test]
    fn dimensions_reject_zero_and_garbage() {
        for text in ["0x3", "3x0", "3", "axb", "3x-1", ""] {
            assert!(parse_dimensions(text).is_err(), "{text:?} must be rejected");
        }
    }

    #[test]
    fn saved_boards_load_back_from_disk() {
        let directory = tempfile::tempdir().expect("temporary directory");
        let path = directory.path().join("nested").join("board.json");
        let mut store = FileBoardStore::new(&path);
        let snapshot = BoardSnapshot {
            cells: vec![vec![
                CellSnapshot {
                    surfaces: vec![SurfaceSnapshot { top: 2, bottom: -1 }],
                },
                CellSnapshot::default(),
            ]],
        };

        store.save(&snapshot).expect("save succeeds");
        assert_eq!(store.path(), path.as_path());
        assert_eq!(store.load().expect("load succeeds"), snapshot);
    }

    #[test]
    fn missing_files_report_the_path() {
        let directory = tempfile::tempdir().expect("temporary directory");
        let mut store = FileBoardStore::new(directory.path().join("absent.json"));

        let error = store.load().expect_err("nothing to load");

        assert!(
            format!("{error:#}").contains("absent.json"),
            "error should name the file: {error:#}"
        );
    }

    #[test]
    fn layouts_with_missing_fields_are_malformed() {
        let directory = tempfile::tempdir().expect("temporary directory");
        let path = directory.path().join("broken.json");
        fs::write(&path, r#"{ "cells": [[{ "surfaces": [{ "top": 1 }] }]] }"#)
            .expect("write fixture");

        let error = FileBoardStore::new(&path).load().expect_err("bottom is missing");

        assert!(
            matches!(
                error.downcast_ref::<tactics_core::BoardError>(),
                Some(tactics_core::BoardError::MalformedSnapshot { .. })
            ),
            "unexpected error: {error:#}"
        );
    }

    #[test]
    fn bundled_board_is_a_valid_layout() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../data/boards/test1.json");
        let snapshot = FileBoardStore::new(path).load().expect("bundled board loads");

        let board = tactics_world::Board::from_snapshot(&snapshot).expect("bundled board is valid");
        assert_eq!(board.size(), BoardSize::new(3, 3));
        assert_eq!(board.to_snapshot(), snapshot);
    }
}
