//! Writes the stats pages of a step next to the snapshots.

use std::fs;
use std::path::Path;

use hunt_core::StatsReport;

/// Writes every page of `report` into `dir`, returning how many were written.
///
/// Failures are logged and skipped; stats never hold up the replay.
pub fn write_stats(dir: &Path, report: &StatsReport) -> usize {
    if let Err(err) = fs::create_dir_all(dir) {
        tracing::warn!(dir = %dir.display(), %err, "cannot create stats directory");
        return 0;
    }
    let mut written = 0;
    for (name, page) in report.pages() {
        let path = dir.join(name);
        match fs::write(&path, page) {
            Ok(()) => written += 1,
            Err(err) => tracing::warn!(path = %path.display(), %err, "cannot write stats page"),
        }
    }
    written
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_all_three_pages() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(write_stats(dir.path(), &StatsReport::default()), 3);
        for name in ["stats_address.html", "stats_hunter.html", "stats_bounty.html"] {
            let page = fs::read_to_string(dir.path().join(name)).unwrap();
            assert!(page.starts_with("<!doctype html>"));
        }
    }

    #[test]
    fn unwritable_directory_is_only_logged() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("taken");
        fs::write(&file, "").unwrap();
        assert_eq!(write_stats(&file, &StatsReport::default()), 0);
    }
}
