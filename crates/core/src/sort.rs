#![forbid(unsafe_code)]

use crate::model::Bullet;

/// Canonical presentation order, shared by the Merger (§4.3 step 4) and the
/// Knowledge Store's `write_bullets` (§4.1), so the playbook file is always
/// in the same order no matter which component last rewrote it.
///
/// Sort key: `(section asc, helpful desc, content asc)`.
pub fn canonical_order(bullets: &mut [Bullet]) {
    bullets.sort_by(|a, b| {
        a.section
            .cmp(&b.section)
            .then_with(|| b.helpful.cmp(&a.helpful))
            .then_with(|| a.content.cmp(&b.content))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::BulletId;

    fn bullet(section: &str, content: &str, helpful: u32) -> Bullet {
        Bullet {
            id: BulletId::try_new(format!("b-{content}")).unwrap(),
            section: section.to_string(),
            content: content.to_string(),
            helpful,
            harmful: 0,
            aggregated_from: None,
            provenance: None,
        }
    }

    #[test]
    fn sorts_by_section_then_helpful_desc_then_content() {
        let mut bullets = vec![
            bullet("b/patterns", "zz", 1),
            bullet("a/patterns", "yy", 1),
            bullet("a/patterns", "xx", 5),
        ];
        canonical_order(&mut bullets);
        let order: Vec<_> = bullets
            .iter()
            .map(|b| (b.section.as_str(), b.content.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![("a/patterns", "xx"), ("a/patterns", "yy"), ("b/patterns", "zz")]
        );
    }

    #[test]
    fn is_stable_across_repeated_calls() {
        let mut first = vec![
            bullet("a/patterns", "one", 1),
            bullet("a/patterns", "two", 1),
        ];
        let mut second = first.clone();
        canonical_order(&mut first);
        canonical_order(&mut second);
        assert_eq!(first, second);
    }
}
