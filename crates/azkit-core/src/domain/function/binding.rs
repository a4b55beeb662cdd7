//! Binding model shared by `function.json` generation and the extension check.

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Direction of a binding relative to the function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    In,
    Out,
    InOut,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::In => write!(f, "in"),
            Self::Out => write!(f, "out"),
            Self::InOut => write!(f, "inout"),
        }
    }
}

/// Every binding the Java annotation library knows about.
///
/// The variant name is the annotation's simple name; [`BindingEnum::binding_type`]
/// is what lands in `function.json`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BindingEnum {
    HttpTrigger,
    HttpOutput,
    TimerTrigger,
    QueueTrigger,
    QueueOutput,
    BlobTrigger,
    BlobInput,
    BlobOutput,
    TableInput,
    TableOutput,
    EventHubTrigger,
    EventHubOutput,
    CosmosDBTrigger,
    CosmosDBInput,
    CosmosDBOutput,
    ServiceBusQueueTrigger,
    ServiceBusTopicTrigger,
    ServiceBusQueueOutput,
    ServiceBusTopicOutput,
    EventGridTrigger,
    EventGridOutput,
    KafkaTrigger,
    KafkaOutput,
    SendGridOutput,
    TwilioSmsOutput,
    SignalRConnectionInfoInput,
    SignalROutput,
    WarmupTrigger,
}

impl BindingEnum {
    pub const ALL: [BindingEnum; 28] = [
        Self::HttpTrigger,
        Self::HttpOutput,
        Self::TimerTrigger,
        Self::QueueTrigger,
        Self::QueueOutput,
        Self::BlobTrigger,
        Self::BlobInput,
        Self::BlobOutput,
        Self::TableInput,
        Self::TableOutput,
        Self::EventHubTrigger,
        Self::EventHubOutput,
        Self::CosmosDBTrigger,
        Self::CosmosDBInput,
        Self::CosmosDBOutput,
        Self::ServiceBusQueueTrigger,
        Self::ServiceBusTopicTrigger,
        Self::ServiceBusQueueOutput,
        Self::ServiceBusTopicOutput,
        Self::EventGridTrigger,
        Self::EventGridOutput,
        Self::KafkaTrigger,
        Self::KafkaOutput,
        Self::SendGridOutput,
        Self::TwilioSmsOutput,
        Self::SignalRConnectionInfoInput,
        Self::SignalROutput,
        Self::WarmupTrigger,
    ];

    /// Annotation simple name, e.g. `HttpTrigger`.
    pub fn annotation(self) -> &'static str {
        match self {
            Self::HttpTrigger => "HttpTrigger",
            Self::HttpOutput => "HttpOutput",
            Self::TimerTrigger => "TimerTrigger",
            Self::QueueTrigger => "QueueTrigger",
            Self::QueueOutput => "QueueOutput",
            Self::BlobTrigger => "BlobTrigger",
            Self::BlobInput => "BlobInput",
            Self::BlobOutput => "BlobOutput",
            Self::TableInput => "TableInput",
            Self::TableOutput => "TableOutput",
            Self::EventHubTrigger => "EventHubTrigger",
            Self::EventHubOutput => "EventHubOutput",
            Self::CosmosDBTrigger => "CosmosDBTrigger",
            Self::CosmosDBInput => "CosmosDBInput",
            Self::CosmosDBOutput => "CosmosDBOutput",
            Self::ServiceBusQueueTrigger => "ServiceBusQueueTrigger",
            Self::ServiceBusTopicTrigger => "ServiceBusTopicTrigger",
            Self::ServiceBusQueueOutput => "ServiceBusQueueOutput",
            Self::ServiceBusTopicOutput => "ServiceBusTopicOutput",
            Self::EventGridTrigger => "EventGridTrigger",
            Self::EventGridOutput => "EventGridOutput",
            Self::KafkaTrigger => "KafkaTrigger",
            Self::KafkaOutput => "KafkaOutput",
            Self::SendGridOutput => "SendGridOutput",
            Self::TwilioSmsOutput => "TwilioSmsOutput",
            Self::SignalRConnectionInfoInput => "SignalRConnectionInfoInput",
            Self::SignalROutput => "SignalROutput",
            Self::WarmupTrigger => "WarmupTrigger",
        }
    }

    /// The `type` value written to `function.json`.
    pub fn binding_type(self) -> &'static str {
        match self {
            Self::HttpTrigger => "httpTrigger",
            Self::HttpOutput => "http",
            Self::TimerTrigger => "timerTrigger",
            Self::QueueTrigger => "queueTrigger",
            Self::QueueOutput => "queue",
            Self::BlobTrigger => "blobTrigger",
            Self::BlobInput | Self::BlobOutput => "blob",
            Self::TableInput | Self::TableOutput => "table",
            Self::EventHubTrigger => "eventHubTrigger",
            Self::EventHubOutput => "eventHub",
            Self::CosmosDBTrigger => "cosmosDBTrigger",
            Self::CosmosDBInput | Self::CosmosDBOutput => "cosmosDB",
            Self::ServiceBusQueueTrigger | Self::ServiceBusTopicTrigger => "serviceBusTrigger",
            Self::ServiceBusQueueOutput | Self::ServiceBusTopicOutput => "serviceBus",
            Self::EventGridTrigger => "eventGridTrigger",
            Self::EventGridOutput => "eventGrid",
            Self::KafkaTrigger => "kafkaTrigger",
            Self::KafkaOutput => "kafka",
            Self::SendGridOutput => "sendGrid",
            Self::TwilioSmsOutput => "twilioSms",
            Self::SignalRConnectionInfoInput => "signalRConnectionInfo",
            Self::SignalROutput => "signalR",
            Self::WarmupTrigger => "warmupTrigger",
        }
    }

    pub fn direction(self) -> Direction {
        match self {
            Self::HttpOutput
            | Self::QueueOutput
            | Self::BlobOutput
            | Self::TableOutput
            | Self::EventHubOutput
            | Self::CosmosDBOutput
            | Self::ServiceBusQueueOutput
            | Self::ServiceBusTopicOutput
            | Self::EventGridOutput
            | Self::KafkaOutput
            | Self::SendGridOutput
            | Self::TwilioSmsOutput
            | Self::SignalROutput => Direction::Out,
            _ => Direction::In,
        }
    }

    pub fn is_trigger(self) -> bool {
        self.binding_type().to_ascii_lowercase().ends_with("trigger")
    }

    /// Bindings the host serves without any extension package.
    pub fn is_builtin_http(self) -> bool {
        matches!(self, Self::HttpTrigger | Self::HttpOutput)
    }

    pub fn from_annotation(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.annotation() == name)
    }
}

impl fmt::Display for BindingEnum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.annotation())
    }
}

/// One entry of the `bindings` array in `function.json`.
///
/// Serialized as `type`, `direction`, `name` followed by the annotation
/// attributes in key order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Binding {
    #[serde(rename = "type")]
    pub binding_type: String,
    pub direction: Direction,
    pub name: String,
    #[serde(flatten)]
    pub attributes: BTreeMap<String, Value>,
    #[serde(skip)]
    kind: Option<BindingEnum>,
}

impl Binding {
    pub fn new(kind: BindingEnum, name: impl Into<String>) -> Self {
        Self {
            binding_type: kind.binding_type().to_string(),
            direction: kind.direction(),
            name: name.into(),
            attributes: BTreeMap::new(),
            kind: Some(kind),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// The annotation this binding was generated from, if known.
    pub fn kind(&self) -> Option<BindingEnum> {
        self.kind
    }

    pub fn is_trigger(&self) -> bool {
        self.binding_type.to_ascii_lowercase().ends_with("trigger")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn annotation_lookup_round_trips_names() {
        assert_eq!(
            BindingEnum::from_annotation("QueueTrigger"),
            Some(BindingEnum::QueueTrigger)
        );
        assert_eq!(BindingEnum::from_annotation("FunctionName"), None);
    }

    #[test]
    fn triggers_are_detected_by_type() {
        assert!(BindingEnum::ServiceBusTopicTrigger.is_trigger());
        assert!(!BindingEnum::HttpOutput.is_trigger());
        assert!(!BindingEnum::BlobInput.is_trigger());
    }

    #[test]
    fn binding_serializes_type_direction_name_first() {
        let binding = Binding::new(BindingEnum::HttpTrigger, "req")
            .with_attribute("authLevel", "ANONYMOUS")
            .with_attribute("methods", serde_json::json!(["GET", "POST"]));

        let json = serde_json::to_string(&binding).unwrap();
        assert_eq!(
            json,
            r#"{"type":"httpTrigger","direction":"in","name":"req","authLevel":"ANONYMOUS","methods":["GET","POST"]}"#
        );
    }
}
