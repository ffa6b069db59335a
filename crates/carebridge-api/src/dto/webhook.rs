//! Query strings carried by webhook URLs

use serde::Deserialize;

/// `POST /api/twiml/connect-sip?room=`
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectSipQuery {
    pub room: String,
}

/// `POST /api/twiml/wait-for-provider?callSid=&attempt=`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitForProviderQuery {
    #[serde(default)]
    pub call_sid: Option<String>,
    #[serde(default)]
    pub attempt: u32,
}
