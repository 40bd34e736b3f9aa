#![forbid(unsafe_code)]

//! Knowledge Store: playbook parsing/serialization and the write-scope
//! guard (§4.1).

use crate::error::StoreError;
use lore_core::ids::BulletId;
use lore_core::model::{Bullet, Provenance};
use lore_core::normalize::bullet_hash_digest;
use lore_core::sort::canonical_order;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

/// §6 Playbook manifest: `version: string` and `sections: [{id, weight}]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlaybookManifest {
    pub version: String,
    #[serde(default)]
    pub sections: Vec<SectionWeight>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SectionWeight {
    pub id: String,
    pub weight: f64,
}

impl PlaybookManifest {
    /// Front-matter is written with keys sorted and sections sorted by id
    /// for determinism (§6).
    fn to_sorted_yaml(&self) -> Result<String, StoreError> {
        let mut sections = self.sections.clone();
        sections.sort_by(|a, b| a.id.cmp(&b.id));
        #[derive(Serialize)]
        struct Ordered<'a> {
            sections: &'a [SectionWeight],
            version: &'a str,
        }
        let ordered = Ordered {
            sections: &sections,
            version: &self.version,
        };
        Ok(serde_yaml::to_string(&ordered)?)
    }
}

/// Owns the playbook file and enforces the write-scope guard (§3
/// Ownership, §4.1 guard).
pub struct KnowledgeStore {
    root: PathBuf,
    playbook_path: PathBuf,
}

impl KnowledgeStore {
    pub fn new(root: impl Into<PathBuf>, playbook_path: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            playbook_path: playbook_path.into(),
        }
    }

    pub fn playbook_path(&self) -> &Path {
        &self.playbook_path
    }

    /// Rejects any write whose resolved path is not under the configured
    /// knowledge root. Failure is a hard error (§4.1 guard, §7 Write scope
    /// violation).
    pub fn guard(&self, path: &Path) -> Result<(), StoreError> {
        let resolved = lexically_normalize(&to_absolute(path));
        let root = lexically_normalize(&to_absolute(&self.root));
        if !resolved.starts_with(&root) {
            return Err(lore_core::CoreError::ScopeViolation {
                attempted: resolved.display().to_string(),
                root: root.display().to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// §7 Artifact missing: a missing playbook yields an empty bullet set,
    /// not an error.
    pub fn load_bullets(&self) -> Result<Vec<Bullet>, StoreError> {
        let Some(raw) = read_optional(&self.playbook_path)? else {
            return Ok(Vec::new());
        };
        let (_, body) = split_front_matter(&raw)?;
        parse_bullets(body)
    }

    pub fn load_manifest(&self) -> Result<Option<PlaybookManifest>, StoreError> {
        let Some(raw) = read_optional(&self.playbook_path)? else {
            return Ok(None);
        };
        let (front_matter, _) = split_front_matter(&raw)?;
        match front_matter {
            Some(yaml) => Ok(Some(serde_yaml::from_str(yaml)?)),
            None => Ok(None),
        }
    }

    /// Serialize grouped by section (alphabetical), bullets within each
    /// section sorted per §4.3's canonical order (§4.1 write_bullets).
    pub fn write_bullets(
        &self,
        bullets: &[Bullet],
        manifest: Option<&PlaybookManifest>,
    ) -> Result<(), StoreError> {
        self.guard(&self.playbook_path)?;
        let text = render_playbook(bullets, manifest)?;
        lore_core::atomic::write_atomic(&self.playbook_path, text.as_bytes())?;
        Ok(())
    }

    /// In-place update of `helpful`/`harmful` counters, preserving all other
    /// bullet state (§4.1 increment_counters). Bullet ids absent from the
    /// live playbook are skipped (no-op), matching the Curator's tolerant
    /// feedback-ingestion contract (§4.5).
    pub fn increment_counters(
        &self,
        increments: &HashMap<BulletId, (u32, u32)>,
    ) -> Result<(), StoreError> {
        let manifest = self.load_manifest()?;
        let mut bullets = self.load_bullets()?;
        for bullet in &mut bullets {
            if let Some((helpful, harmful)) = increments.get(&bullet.id) {
                bullet.helpful += helpful;
                bullet.harmful += harmful;
            }
        }
        self.write_bullets(&bullets, manifest.as_ref())
    }
}

fn to_absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_default()
            .join(path)
    }
}

fn lexically_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                out.pop();
            }
            Component::CurDir => {}
            other => out.push(other.as_os_str()),
        }
    }
    out
}

fn read_optional(path: &Path) -> Result<Option<String>, StoreError> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}

/// Splits a leading `---`-bounded YAML front-matter block from the body.
fn split_front_matter(raw: &str) -> Result<(Option<&str>, &str), StoreError> {
    let Some(rest) = raw.strip_prefix("---\n") else {
        return Ok((None, raw));
    };
    let Some(end) = rest.find("\n---\n") else {
        return Err(StoreError::MalformedFile {
            path: "playbook".to_string(),
            detail: "unterminated front-matter block".to_string(),
        });
    };
    let front_matter = &rest[..end];
    let body = &rest[end + "\n---\n".len()..];
    Ok((Some(front_matter), body))
}

/// Section identity is derived by lowercasing and replacing whitespace with
/// `/` (§4.1).
fn section_identity(heading_text: &str) -> String {
    heading_text
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("/")
}

fn parse_bullets(body: &str) -> Result<Vec<Bullet>, StoreError> {
    let lines: Vec<&str> = body.lines().collect();
    let mut bullets = Vec::new();
    let mut current_section = String::new();
    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];
        let trimmed = line.trim_start();
        if let Some(heading) = trimmed.strip_prefix("### ") {
            current_section = section_identity(heading);
        } else if let Some(heading) = trimmed.strip_prefix("## ") {
            current_section = section_identity(heading);
        } else if let Some(mut bullet) = parse_bullet_line(line, &current_section) {
            if i + 1 < lines.len() {
                if let Some(provenance) = parse_provenance_comment(lines[i + 1]) {
                    bullet.provenance = Some(provenance);
                    i += 1;
                }
            }
            bullets.push(bullet);
        }
        i += 1;
    }
    Ok(bullets)
}

fn parse_bullet_line(line: &str, section: &str) -> Option<Bullet> {
    let line = line.trim_start();
    let rest = line.strip_prefix("[Bullet #")?;
    let close = rest.find(']')?;
    let header = &rest[..close];
    let content = rest[close + 1..].trim_start().to_string();

    let mut parts = header.split(", ");
    let id = parts.next()?.trim();
    let helpful_part = parts.next()?.trim();
    let harmful_part = parts.next()?.trim();
    let helpful: u32 = helpful_part.strip_prefix("helpful:")?.parse().ok()?;
    let harmful: u32 = harmful_part.strip_prefix("harmful:")?.parse().ok()?;

    let extra: Vec<&str> = parts.collect();
    let aggregated_from = extra.iter().find_map(|piece| {
        piece
            .strip_prefix("Aggregated from ")
            .and_then(|rest| rest.strip_suffix(" instances"))
            .and_then(|count| count.parse::<u32>().ok())
    });

    Some(Bullet {
        id: BulletId::try_new(id).ok()?,
        section: section.to_string(),
        content,
        helpful,
        harmful,
        aggregated_from,
        provenance: None,
    })
}

fn parse_provenance_comment(line: &str) -> Option<Provenance> {
    let trimmed = line.trim();
    let inner = trimmed.strip_prefix("<!-- ")?.strip_suffix(" -->")?;
    let mut delta_id = None;
    let mut source_id = None;
    let mut created_at = None;
    for field in inner.split(", ") {
        let (key, value) = field.split_once('=')?;
        match key {
            "deltaId" => delta_id = value.parse().ok(),
            "sourceId" => source_id = Some(value.to_string()),
            "createdAt" => created_at = Some(value.to_string()),
            "hash" => {}
            _ => {}
        }
    }
    Some(Provenance {
        delta_id: delta_id?,
        source_id: source_id?,
        created_at: created_at?,
    })
}

fn render_playbook(
    bullets: &[Bullet],
    manifest: Option<&PlaybookManifest>,
) -> Result<String, StoreError> {
    let mut ordered = bullets.to_vec();
    canonical_order(&mut ordered);

    let mut out = String::new();
    if let Some(manifest) = manifest {
        out.push_str("---\n");
        out.push_str(&manifest.to_sorted_yaml()?);
        out.push_str("---\n");
    }

    let mut current_section: Option<&str> = None;
    for bullet in &ordered {
        if current_section != Some(bullet.section.as_str()) {
            if current_section.is_some() {
                out.push('\n');
            }
            out.push_str("## ");
            out.push_str(&bullet.section);
            out.push('\n');
            current_section = Some(bullet.section.as_str());
        }
        out.push_str(&render_bullet_line(bullet));
        out.push('\n');
        if let Some(provenance) = &bullet.provenance {
            out.push_str(&render_provenance_comment(bullet, provenance));
            out.push('\n');
        }
    }
    Ok(out)
}

fn render_bullet_line(bullet: &Bullet) -> String {
    let mut header = format!(
        "Bullet #{}, helpful:{}, harmful:{}",
        bullet.id, bullet.helpful, bullet.harmful
    );
    if let Some(k) = bullet.aggregated_from {
        header.push_str(&format!(", Aggregated from {k} instances"));
    }
    format!("[{header}] {}", bullet.content)
}

fn render_provenance_comment(bullet: &Bullet, provenance: &Provenance) -> String {
    let hash = bullet_hash_digest(&bullet.section, &bullet.content);
    format!(
        "<!-- deltaId={}, sourceId={}, createdAt={}, hash={} -->",
        provenance.delta_id, provenance.source_id, provenance.created_at, hash
    )
}

/// §4.1 `find_insert_position`: the line index after the last bullet (or
/// its provenance comment) of `section`, or `None` if the section has no
/// heading in `body` — the caller is expected to skip the operation and
/// surface that to the user rather than guess a position.
pub fn find_insert_position(body: &str, section: &str) -> Option<usize> {
    let lines: Vec<&str> = body.lines().collect();
    let mut in_section = false;
    let mut saw_section = false;
    let mut last_bullet_line: Option<usize> = None;
    let mut i = 0;
    while i < lines.len() {
        let trimmed = lines[i].trim_start();
        if let Some(heading) = trimmed
            .strip_prefix("### ")
            .or_else(|| trimmed.strip_prefix("## "))
        {
            in_section = section_identity(heading) == section;
            if in_section {
                saw_section = true;
            }
        } else if in_section && parse_bullet_line(lines[i], section).is_some() {
            last_bullet_line = Some(i);
            if i + 1 < lines.len() && parse_provenance_comment(lines[i + 1]).is_some() {
                last_bullet_line = Some(i + 1);
                i += 1;
            }
        }
        i += 1;
    }
    if !saw_section {
        return None;
    }
    Some(last_bullet_line.map_or_else(
        || {
            lines
                .iter()
                .enumerate()
                .find(|(_, line)| {
                    let trimmed = line.trim_start();
                    section_identity(
                        trimmed
                            .strip_prefix("### ")
                            .or_else(|| trimmed.strip_prefix("## "))
                            .unwrap_or(""),
                    ) == section
                })
                .map(|(idx, _)| idx + 1)
                .unwrap_or(lines.len())
        },
        |idx| idx + 1,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lore_core::ids::DeltaId;

    fn bullet(id: &str, section: &str, content: &str, helpful: u32, harmful: u32) -> Bullet {
        Bullet {
            id: BulletId::try_new(id).unwrap(),
            section: section.to_string(),
            content: content.to_string(),
            helpful,
            harmful,
            aggregated_from: None,
            provenance: None,
        }
    }

    #[test]
    fn render_then_parse_round_trips_canonical_bullets() {
        let bullets = vec![
            bullet("b1", "test/patterns", "Always validate input", 3, 0),
            bullet("b2", "test/patterns", "Mock external calls", 1, 0),
            bullet("b3", "build/patterns", "Pin toolchain versions", 2, 0),
        ];
        let text = render_playbook(&bullets, None).unwrap();
        let (_, body) = split_front_matter(&text).unwrap();
        let mut parsed = parse_bullets(body).unwrap();
        canonical_order(&mut parsed);

        let mut expected = bullets.clone();
        canonical_order(&mut expected);
        assert_eq!(parsed, expected);
    }

    #[test]
    fn provenance_comment_round_trips() {
        let mut b = bullet("b1", "test/patterns", "Always validate input", 1, 0);
        b.provenance = Some(Provenance {
            delta_id: DeltaId::new(),
            source_id: "ITEM-1".to_string(),
            created_at: "2026-07-26T00:00:00Z".to_string(),
        });
        let text = render_playbook(&[b.clone()], None).unwrap();
        let (_, body) = split_front_matter(&text).unwrap();
        let parsed = parse_bullets(body).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].provenance, b.provenance);
    }

    #[test]
    fn aggregated_from_round_trips() {
        let mut b = bullet("b1", "test/patterns", "Always validate input", 4, 0);
        b.aggregated_from = Some(3);
        let text = render_playbook(&[b.clone()], None).unwrap();
        let (_, body) = split_front_matter(&text).unwrap();
        let parsed = parse_bullets(body).unwrap();
        assert_eq!(parsed[0].aggregated_from, Some(3));
    }

    #[test]
    fn section_identity_lowercases_and_joins_with_slash() {
        assert_eq!(section_identity("TypeScript Patterns"), "typescript/patterns");
    }

    #[test]
    fn find_insert_position_returns_none_for_missing_section() {
        let body = "## test/patterns\n[Bullet #b1, helpful:1, harmful:0] content here\n";
        assert_eq!(find_insert_position(body, "other/section"), None);
    }

    #[test]
    fn find_insert_position_points_after_last_bullet() {
        let body = "## test/patterns\n[Bullet #b1, helpful:1, harmful:0] content here\n[Bullet #b2, helpful:1, harmful:0] more content\n";
        assert_eq!(find_insert_position(body, "test/patterns"), Some(3));
    }

    #[test]
    fn guard_rejects_path_outside_root() {
        let store = KnowledgeStore::new("/tmp/lore-root", "/tmp/lore-root/AGENTS.md");
        assert!(store.guard(store.playbook_path()).is_ok());
        assert!(store.guard(Path::new("/tmp/elsewhere/AGENTS.md")).is_err());
    }
}
