//! Synthetic rule table generation.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{Context, Result};
use fwchat_rules::{RuleEntities, RuleRecord, RuleTable};
use tracing::info;

pub const DEFAULT_COUNT: usize = 10_000;
pub const DEFAULT_OUTPUT: &str = "data/raw/firewall_rules_annotated.csv";

const ZONES: &[&str] = &["LAN", "WAN", "DMZ"];
const SERVICES: &[&str] = &["HTTP", "HTTPS", "FTP", "SSH", "Telnet", "RDP", "Any"];

/// SplitMix64. Small, seedable and good enough for sample data.
#[derive(Debug, Clone)]
pub struct SampleRng {
    state: u64,
}

impl SampleRng {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Seed from OS entropy.
    pub fn from_entropy() -> Result<Self> {
        let mut buf = [0u8; 8];
        getrandom::fill(&mut buf).map_err(|e| anyhow::anyhow!("read OS entropy: {e}"))?;
        Ok(Self::new(u64::from_le_bytes(buf)))
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9e37_79b9_7f4a_7c15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^ (z >> 31)
    }

    /// Uniform value in `lo..=hi`.
    pub fn between(&mut self, lo: u64, hi: u64) -> u64 {
        lo + self.next_u64() % (hi - lo + 1)
    }

    pub fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[self.next_u64() as usize % items.len()]
    }
}

/// A dotted-quad address with non-zero first and last octets.
pub fn random_address(rng: &mut SampleRng) -> String {
    format!(
        "{}.{}.{}.{}",
        rng.between(1, 255),
        rng.between(0, 255),
        rng.between(0, 255),
        rng.between(1, 255)
    )
}

pub fn sample_rule(rng: &mut SampleRng) -> RuleRecord {
    let source = random_address(rng);
    let destination = random_address(rng);
    let source_zone = rng.pick(ZONES);
    let destination_zone = rng.pick(ZONES);
    let service = rng.pick(SERVICES);

    let prompt = format!(
        r#"Allow access for IP "{destination}" from "{source}" source and "{source_zone}" zone to "{destination_zone}" zone with Service "{service}""#
    );
    let response = format!(
        "Allow {service} from {source} ({source_zone}) to {destination} ({destination_zone})"
    );

    RuleRecord {
        prompt,
        entities: RuleEntities {
            ip_addresses: [destination, source].into_iter().collect(),
            source_zone: Some(source_zone.to_string()),
            destination_zone: Some(destination_zone.to_string()),
            service: Some(service.to_string()),
        },
        response,
    }
}

pub fn generate(count: usize, rng: &mut SampleRng) -> RuleTable {
    (0..count).map(|_| sample_rule(rng)).collect()
}

/// Write `table` as CSV to `path`, creating parent directories.
pub fn write(path: &Path, table: &RuleTable) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    }
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    table
        .write_csv(BufWriter::new(file))
        .with_context(|| format!("write {}", path.display()))?;

    info!(rows = table.len(), path = %path.display(), "wrote dataset");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fwchat_rules::{Chatbot, MatchOptions, Predicate};

    #[test]
    fn test_seeded_runs_repeat() {
        let a = generate(50, &mut SampleRng::new(7));
        let b = generate(50, &mut SampleRng::new(7));
        let c = generate(50, &mut SampleRng::new(8));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_address_octets() {
        let mut rng = SampleRng::new(1);
        for _ in 0..1000 {
            let addr = random_address(&mut rng);
            let octets: Vec<u16> = addr.split('.').map(|o| o.parse().unwrap()).collect();
            assert_eq!(octets.len(), 4);
            assert!(octets.iter().all(|&o| o <= 255));
            assert!(octets[0] >= 1 && octets[3] >= 1, "{addr}");
        }
    }

    #[test]
    fn test_generated_prompts_extract_their_entities() {
        let table = generate(200, &mut SampleRng::new(42));
        let opts = MatchOptions::new().with_predicates([
            Predicate::Ip,
            Predicate::SourceZone,
            Predicate::DestinationZone,
            Predicate::Service,
        ]);
        let bot = Chatbot::new(table.clone(), opts).unwrap();

        for rule in &table {
            let entities = bot.extract(&rule.prompt);
            assert_eq!(entities.ip_addresses.len(), 2, "{}", rule.prompt);
            assert!(entities.ip_addresses.iter().all(|ip| rule.entities.contains_address(ip)));
            assert_eq!(entities.source_zone, rule.entities.source_zone);
            assert_eq!(entities.destination_zone, rule.entities.destination_zone);
            assert_eq!(entities.service, rule.entities.service);
            assert!(bot.process(&rule.prompt).is_success());
        }
    }

    #[test]
    fn test_write_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data/raw/rules.csv");
        let table = generate(10, &mut SampleRng::new(3));

        write(&path, &table).unwrap();
        assert_eq!(RuleTable::load(&path).unwrap(), table);
    }
}
