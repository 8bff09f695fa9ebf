use anyhow::{ensure, Context};
use rollup_polars::prelude::{DataFrame, NamedFrom, Series};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;


pub const ADDRESS_COLUMN: &str = "sequencer_addresses";
pub const NAME_COLUMN: &str = "sequencer_names";


/// On-disk form of the registry: two parallel lists of equal length.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistryConfig {
    pub sequencer_addresses: Vec<String>,
    pub sequencer_names: Vec<String>
}


#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Sequencer {
    pub address: String,
    pub name: String
}


/// Known rollup sequencers, keyed by the address they post batches from.
#[derive(Debug, Clone)]
pub struct SequencerRegistry {
    sequencers: Vec<Sequencer>
}


impl SequencerRegistry {
    pub fn new(config: RegistryConfig) -> anyhow::Result<Self> {
        ensure!(
            config.sequencer_addresses.len() == config.sequencer_names.len(),
            "registry has {} addresses, but {} names",
            config.sequencer_addresses.len(),
            config.sequencer_names.len()
        );

        let sequencers = config.sequencer_addresses.into_iter()
            .zip(config.sequencer_names)
            .map(|(address, name)| Sequencer { address, name })
            .collect();

        let registry = Self { sequencers };
        registry.validate()?;
        Ok(registry)
    }

    pub fn read(file: impl AsRef<Path>) -> anyhow::Result<Self> {
        let config: RegistryConfig = serde_json::from_reader(
            std::io::BufReader::new(std::fs::File::open(file)?)
        )?;
        Self::new(config).context("invalid sequencer registry")
    }

    /// Batch posters of the major L2 rollups on Ethereum mainnet.
    pub fn l2_sequencers() -> Self {
        let sequencers = [
            ("0xc1b634853cb333d3ad8663715b08f41a3aec47cc", "arbitrum"),
            ("0x6887246668a3b87f54deb3b94ba47a6f63f32985", "optimism"),
            ("0x9228624c3185fcbcf24c1c9db76d8bef5f5dad64", "linea"),
            ("0x6667961f5e9c98a76a48767522150889703ed77d", "mantle"),
            ("0xcf2898225ed05be911d3709d9417e86e0b4cfc8f", "scroll"),
            ("0x148ee7daf16574cd020afa34cc658f8f3fbd2800", "polygon_zkevm"),
            ("0x16d5783a96ab20c9157d7933ac236646b29589a4", "starknet"),
            ("0x5050f69a9786f081509234f1a7f4684b5e5b76c9", "base"),
        ].into_iter().map(|(address, name)| Sequencer {
            address: address.to_string(),
            name: name.to_string()
        }).collect();

        Self { sequencers }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let mut addresses = HashSet::new();
        let mut names = HashSet::new();

        for seq in self.sequencers.iter() {
            ensure!(
                is_lower_hex_address(&seq.address),
                "sequencer address {} is not a lower-case 0x-prefixed hex string",
                seq.address
            );
            ensure!(!seq.name.is_empty(), "sequencer {} has an empty name", seq.address);
            ensure!(
                addresses.insert(seq.address.as_str()),
                "sequencer address {} is listed more than once",
                seq.address
            );
            ensure!(
                names.insert(seq.name.as_str()),
                "sequencer name {} is used more than once",
                seq.name
            );
        }

        Ok(())
    }

    pub fn addresses(&self) -> impl Iterator<Item = &str> + '_ {
        self.sequencers.iter().map(|seq| seq.address.as_str())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.sequencers.iter().map(|seq| seq.name.as_str())
    }

    /// Registry as a two column frame: `sequencer_addresses`, `sequencer_names`
    pub fn to_df(&self) -> anyhow::Result<DataFrame> {
        let addresses: Vec<&str> = self.addresses().collect();
        let names: Vec<&str> = self.names().collect();
        let df = DataFrame::new(vec![
            Series::new(ADDRESS_COLUMN.into(), addresses),
            Series::new(NAME_COLUMN.into(), names)
        ])?;
        Ok(df)
    }

    pub fn names_series(&self) -> Series {
        let names: Vec<&str> = self.names().collect();
        Series::new(NAME_COLUMN.into(), names)
    }
}


impl Default for SequencerRegistry {
    fn default() -> Self {
        Self::l2_sequencers()
    }
}


fn is_lower_hex_address(s: &str) -> bool {
    s.strip_prefix("0x").is_some_and(|hex| {
        !hex.is_empty() && hex.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
    })
}
