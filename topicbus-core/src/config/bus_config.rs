use config::builder::DefaultState;
use config::{File, FileFormat, Source};
use serde::{Deserialize, Serialize};

use crate::config::ConfigBuilder;
use crate::TOPIC_BUS_CONFIG;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BusConfig {
    pub delivery_order: DeliveryOrder,
    pub failure_policy: FailurePolicy,
}

impl BusConfig {
    pub fn builder() -> BusConfigBuilder {
        BusConfigBuilder::default()
    }
}

/// Traversal order of a topic's subscription list during publish. Fixed at
/// bus construction and identical for every topic and payload.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryOrder {
    /// Registration order, oldest subscription first.
    #[default]
    Oldest,
    /// Reverse registration order, newest subscription first.
    Newest,
}

/// What publish does with the rest of a topic's subscribers once one of them
/// returns an error.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailurePolicy {
    /// Attempt every snapshotted subscriber exactly once, logging failures.
    #[default]
    ContinueOnError,
    /// Skip the remaining subscribers of that publish call.
    StopOnError,
}

#[derive(Debug)]
pub struct BusConfigBuilder {
    builder: config::ConfigBuilder<DefaultState>,
}

impl Default for BusConfigBuilder {
    fn default() -> Self {
        // later sources take precedence, so the embedded defaults go in first
        let builder = config::Config::builder()
            .add_source(File::from_str(TOPIC_BUS_CONFIG, FileFormat::Toml));
        Self { builder }
    }
}

impl ConfigBuilder for BusConfigBuilder {
    type C = BusConfig;

    fn add_source<T>(self, source: T) -> anyhow::Result<Self>
        where
            T: Source + Send + Sync + 'static,
    {
        Ok(Self { builder: self.builder.add_source(source) })
    }

    fn build(self) -> anyhow::Result<Self::C> {
        let bus_config = self.builder.build()?.try_deserialize::<Self::C>()?;
        Ok(bus_config)
    }
}
