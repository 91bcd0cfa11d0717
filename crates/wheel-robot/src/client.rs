//! Robot service client.
//!
//! Calls are unary JSON requests posted to `/{service}/{Method}` on the robot
//! address, authenticated with an API key pair sent as `key_id`/`key` headers.
//!
//! This is a placeholder transport. A stock robot server speaks gRPC or
//! WebRTC behind an auth handshake and will not answer these requests; it
//! works against a JSON gateway exposing the same method paths. Everything
//! above [`Motor`] is independent of it, so a native client can replace
//! [`RobotClient`] without touching the control loop.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, trace, warn};
use url::Url;

use crate::error::{Result, RobotError};
use crate::motor::Motor;

/// Name of the wheel motor component.
pub const DEFAULT_MOTOR_NAME: &str = "wheel_motor";

const ROBOT_SERVICE: &str = "viam.robot.v1.RobotService";
const MOTOR_SERVICE: &str = "viam.component.motor.v1.MotorService";
const MOTOR_SUBTYPE: &str = "motor";

/// Delay between connection attempts.
const CONNECT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// API key credentials for the robot service.
#[derive(Clone)]
pub struct ApiKey {
    /// Key identifier.
    pub id: String,
    /// Key secret.
    pub key: String,
}

impl ApiKey {
    /// Creates a key pair.
    pub fn new(id: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            key: key.into(),
        }
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKey")
            .field("id", &self.id)
            .field("key", &"<redacted>")
            .finish()
    }
}

/// A resource exposed by the robot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceName {
    /// Resource namespace, e.g. "rdk".
    #[serde(default)]
    pub namespace: String,
    /// Resource type, e.g. "component".
    #[serde(default, rename = "type")]
    pub kind: String,
    /// Resource subtype, e.g. "motor".
    #[serde(default)]
    pub subtype: String,
    /// Configured name.
    pub name: String,
}

#[derive(Deserialize)]
struct ResourceNamesResponse {
    #[serde(default)]
    resources: Vec<ResourceName>,
}

/// A connected robot.
#[derive(Clone)]
pub struct RobotClient {
    http: reqwest::Client,
    base_url: Url,
    credentials: ApiKey,
    resources: Vec<ResourceName>,
}

impl RobotClient {
    /// Connects to the robot and lists its resources.
    pub async fn connect(address: &str, credentials: ApiKey, http: reqwest::Client) -> Result<Self> {
        let base_url = normalize_address(address)?;
        let mut client = Self {
            http,
            base_url,
            credentials,
            resources: Vec::new(),
        };

        let response: ResourceNamesResponse =
            serde_json::from_value(client.call(ROBOT_SERVICE, "ResourceNames", json!({})).await?)?;
        client.resources = response.resources;

        info!(
            address = %client.base_url,
            resources = client.resources.len(),
            "connected to robot"
        );
        Ok(client)
    }

    /// Connects, retrying up to `attempts` times.
    pub async fn connect_with_retry(
        address: &str,
        credentials: ApiKey,
        http: reqwest::Client,
        attempts: usize,
    ) -> Result<Self> {
        let attempts = attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            debug!(attempt, attempts, "connecting to robot");
            match Self::connect(address, credentials.clone(), http.clone()).await {
                Ok(client) => return Ok(client),
                Err(e @ RobotError::InvalidAddress(_)) => return Err(e),
                Err(e) => {
                    warn!(attempt, attempts, error = %e, "failed to connect to robot");
                    last_error = e.to_string();
                }
            }
            if attempt < attempts {
                tokio::time::sleep(CONNECT_RETRY_DELAY).await;
            }
        }

        Err(RobotError::Connect {
            address: address.to_string(),
            reason: last_error,
        })
    }

    /// Resources reported at connect time.
    pub fn resources(&self) -> &[ResourceName] {
        &self.resources
    }

    /// Returns a handle to the named motor.
    pub fn motor(&self, name: &str) -> Result<RobotMotor> {
        find_motor(&self.resources, name)?;
        Ok(RobotMotor {
            client: self.clone(),
            name: name.to_string(),
        })
    }

    async fn call(&self, service: &str, method: &str, body: Value) -> Result<Value> {
        let method = format!("{}/{}", service, method);
        let url = self.base_url.join(&method)?;
        trace!(method = %method, "robot call");

        let response = self
            .http
            .post(url)
            .header("key_id", &self.credentials.id)
            .header("key", &self.credentials.key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(RobotError::Rpc {
                method,
                status,
                body,
            });
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Ok(json!({}));
        }
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// A motor component on a connected robot.
#[derive(Clone)]
pub struct RobotMotor {
    client: RobotClient,
    name: String,
}

#[async_trait]
impl Motor for RobotMotor {
    fn name(&self) -> &str {
        &self.name
    }

    async fn set_power(&self, power: f64) -> Result<()> {
        self.client
            .call(
                MOTOR_SERVICE,
                "SetPower",
                json!({ "name": self.name, "powerPct": power }),
            )
            .await?;
        Ok(())
    }
}

fn normalize_address(address: &str) -> Result<Url> {
    let with_scheme = if address.contains("://") {
        address.to_string()
    } else {
        format!("https://{}", address)
    };
    let mut url = Url::parse(&with_scheme)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn find_motor<'a>(resources: &'a [ResourceName], name: &str) -> Result<&'a ResourceName> {
    resources
        .iter()
        .find(|r| r.subtype == MOTOR_SUBTYPE && r.name == name)
        .ok_or_else(|| RobotError::MotorNotFound(name.to_string()))
}
