use anyhow::Result;
use dmi_merge_git::{ConflictEntry, Stage};
use serde::Serialize;

use crate::context::{self, Options};
use crate::format::OutputFormat;

#[derive(Serialize)]
struct ListedConflict {
    path: String,
    stages: Vec<u32>,
    missing: Vec<&'static str>,
}

impl From<&ConflictEntry> for ListedConflict {
    fn from(entry: &ConflictEntry) -> Self {
        Self {
            path: entry.path.clone(),
            stages: entry.stages.iter().map(|s| s.number()).collect(),
            missing: entry.missing().into_iter().map(Stage::role).collect(),
        }
    }
}

/// Conflicted index entries whose name ends in `.dmi`.
fn dmi_conflicts(entries: &[ConflictEntry]) -> Vec<&ConflictEntry> {
    entries
        .iter()
        .filter(|e| {
            std::path::Path::new(&e.path)
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("dmi"))
        })
        .collect()
}

pub fn run(opts: &Options, format: OutputFormat) -> Result<()> {
    let config = opts.load_config()?;
    let store = context::open_store(&config)?;
    let entries = store.conflicts()?;
    let conflicts = dmi_conflicts(&entries);

    match format {
        OutputFormat::Json => {
            let listed: Vec<ListedConflict> = conflicts.into_iter().map(ListedConflict::from).collect();
            println!("{}", format.serialize(&listed)?);
        }
        OutputFormat::Text => {
            if conflicts.is_empty() {
                println!("No conflicted .dmi files.");
            }
            for entry in conflicts {
                if entry.is_three_way() {
                    println!("{}", entry.path);
                } else {
                    let missing: Vec<&str> = entry.missing().into_iter().map(Stage::role).collect();
                    println!("{} (missing: {})", entry.path, missing.join(", "));
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_dmi_paths_are_listed() {
        let entries = vec![
            ConflictEntry {
                path: "icons/mob.dmi".to_owned(),
                stages: Stage::ALL.to_vec(),
            },
            ConflictEntry {
                path: "code/mob.dm".to_owned(),
                stages: Stage::ALL.to_vec(),
            },
            ConflictEntry {
                path: "icons/OBJ.DMI".to_owned(),
                stages: vec![Stage::Base, Stage::Ours],
            },
        ];
        let listed: Vec<&str> = dmi_conflicts(&entries).iter().map(|e| e.path.as_str()).collect();
        assert_eq!(listed, vec!["icons/mob.dmi", "icons/OBJ.DMI"]);

        let json = ListedConflict::from(&entries[2]);
        assert_eq!(json.stages, vec![1, 2]);
        assert_eq!(json.missing, vec!["incoming"]);
    }
}
