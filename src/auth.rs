//! Authentication for Mojang (Yggdrasil) and Microsoft accounts, with the
//! persisted session database.
//!
//! Both session kinds expose the same lifecycle: `validate` checks that the
//! stored access token still works, `refresh` renews it in place and
//! `invalidate` revokes it. The session's output feeds the launcher's
//! argument substitution (access token, UUID, user type, XUID).

use std::collections::HashMap;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::fs::{self, File};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;
use reqwest::{Method, Url};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::http::{self, Body, JsonRequestError};


/// Base URL of the Mojang authentication server.
const YGGDRASIL_URL: &str = "https://authserver.mojang.com/";

/// Microsoft OAuth endpoints.
const MS_TOKEN_URL: &str = "https://login.live.com/oauth20_token.srf";
const MS_AUTHORIZE_URL: &str = "https://login.live.com/oauth20_authorize.srf";
const MS_LOGOUT_URL: &str = "https://login.live.com/oauth20_logout.srf";

/// Xbox Live and Minecraft services endpoints.
const XBL_USER_URL: &str = "https://user.auth.xboxlive.com/user/authenticate";
const XBL_XSTS_URL: &str = "https://xsts.auth.xboxlive.com/xsts/authorize";
const MC_LOGIN_URL: &str = "https://api.minecraftservices.com/authentication/login_with_xbox";
const MC_PROFILE_URL: &str = "https://api.minecraftservices.com/minecraft/profile";

/// OAuth scope requested for Microsoft authentication.
const MS_SCOPE: &str = "xboxlive.signin offline_access openid email";

/// File name of the session database, inside the working directory. The name
/// is kept from older launcher generations so existing installations keep
/// their sessions.
pub const AUTH_DATABASE_NAME: &str = "portablemc_auth.json";

/// File name of the legacy line-oriented session file, imported once into the
/// database and then deleted.
pub const AUTH_DATABASE_LEGACY_NAME: &str = "portablemc_tokens";


/// An authenticated session of any supported kind.
#[derive(Debug, Clone)]
pub enum AuthSession {
    Yggdrasil(YggdrasilSession),
    Microsoft(MicrosoftSession),
}

impl AuthSession {

    /// The kind of this session, also the database discriminator.
    #[inline]
    pub fn kind(&self) -> SessionKind {
        match self {
            AuthSession::Yggdrasil(_) => SessionKind::Yggdrasil,
            AuthSession::Microsoft(_) => SessionKind::Microsoft,
        }
    }

    /// The `user_type` value passed to the game.
    #[inline]
    pub fn user_type(&self) -> &'static str {
        match self {
            AuthSession::Yggdrasil(_) => "mojang",
            AuthSession::Microsoft(_) => "msa",
        }
    }

    #[inline]
    pub fn access_token(&self) -> &str {
        match self {
            AuthSession::Yggdrasil(session) => &session.access_token,
            AuthSession::Microsoft(session) => &session.access_token,
        }
    }

    #[inline]
    pub fn username(&self) -> &str {
        match self {
            AuthSession::Yggdrasil(session) => &session.username,
            AuthSession::Microsoft(session) => &session.username,
        }
    }

    /// The player UUID, 32 hex characters without dashes.
    #[inline]
    pub fn uuid(&self) -> &str {
        match self {
            AuthSession::Yggdrasil(session) => &session.uuid,
            AuthSession::Microsoft(session) => &session.uuid,
        }
    }

    #[inline]
    pub fn client_id(&self) -> &str {
        match self {
            AuthSession::Yggdrasil(session) => &session.client_id,
            AuthSession::Microsoft(session) => &session.client_id,
        }
    }

    /// The Xbox user id of the session, empty for Yggdrasil sessions.
    #[inline]
    pub fn xuid(&self) -> &str {
        match self {
            AuthSession::Yggdrasil(_) => "",
            AuthSession::Microsoft(session) => &session.xuid,
        }
    }

    /// Format the token argument passed to the game, the legacy form is
    /// `token:<access_token>:<uuid>`, the modern form the bare token.
    pub fn format_token_argument(&self, legacy: bool) -> String {
        if legacy {
            format!("token:{}:{}", self.access_token(), self.uuid())
        } else {
            self.access_token().to_string()
        }
    }

    /// Check that the session is still usable as-is, without renewing it.
    pub fn validate(&mut self) -> Result<bool> {
        match self {
            AuthSession::Yggdrasil(session) => session.validate(),
            AuthSession::Microsoft(session) => session.validate(),
        }
    }

    /// Renew the session in place.
    pub fn refresh(&mut self) -> Result<()> {
        match self {
            AuthSession::Yggdrasil(session) => session.refresh(),
            AuthSession::Microsoft(session) => session.refresh(),
        }
    }

    /// Revoke the session.
    pub fn invalidate(&self) -> Result<()> {
        match self {
            AuthSession::Yggdrasil(session) => session.invalidate(),
            AuthSession::Microsoft(_) => Ok(()),
        }
    }

}

/// Discriminator of a session kind, also the top-level database key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionKind {
    Yggdrasil,
    Microsoft,
}

impl SessionKind {

    pub fn as_str(self) -> &'static str {
        match self {
            SessionKind::Yggdrasil => "yggdrasil",
            SessionKind::Microsoft => "microsoft",
        }
    }

}

/// A legacy Mojang account session against the Yggdrasil auth server.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct YggdrasilSession {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub uuid: String,
    #[serde(default)]
    pub client_id: String,
}

impl YggdrasilSession {

    /// Authenticate a Mojang account from its email and password, the client
    /// id is the launcher's stable identifier.
    pub fn authenticate(client_id: &str, email: &str, password: &str) -> Result<Self> {

        let (_, res) = request_yggdrasil("authenticate", json!({
            "agent": {
                "name": "Minecraft",
                "version": 1,
            },
            "username": email,
            "password": password,
            "clientToken": client_id,
        }), true)?;

        Ok(Self {
            access_token: extract_str(&res, &["accessToken"])?,
            username: extract_str(&res, &["selectedProfile", "name"])?,
            uuid: extract_str(&res, &["selectedProfile", "id"])?,
            client_id: extract_str(&res, &["clientToken"])?,
        })

    }

    /// A session is valid if and only if the server answers 204.
    pub fn validate(&self) -> Result<bool> {
        let (status, _) = request_yggdrasil("validate", json!({
            "accessToken": self.access_token,
            "clientToken": self.client_id,
        }), false)?;
        Ok(status == 204)
    }

    /// Renew the access token, this also picks up a renamed profile.
    pub fn refresh(&mut self) -> Result<()> {
        let (_, res) = request_yggdrasil("refresh", json!({
            "accessToken": self.access_token,
            "clientToken": self.client_id,
        }), true)?;
        self.access_token = extract_str(&res, &["accessToken"])?;
        self.username = extract_str(&res, &["selectedProfile", "name"])?;
        Ok(())
    }

    /// Revoke the access token.
    pub fn invalidate(&self) -> Result<()> {
        request_yggdrasil("invalidate", json!({
            "accessToken": self.access_token,
            "clientToken": self.client_id,
        }), false)?;
        Ok(())
    }

}

/// POST to an Yggdrasil endpoint; when `error` is set, any non-200 answer is
/// raised with the server's message.
fn request_yggdrasil(endpoint: &str, payload: Value, error: bool) -> Result<(u16, Value)> {

    let url = format!("{YGGDRASIL_URL}{endpoint}");
    let (status, res) = http::json_request(Method::POST, &url, Body::Json(&payload), None, true, None)?;

    if error && status != 200 {
        return Err(Error::Yggdrasil {
            message: res.get("errorMessage")
                .and_then(Value::as_str)
                .unwrap_or("unknown error")
                .to_string(),
        });
    }

    Ok((status, res))

}

/// A Microsoft account session, the OAuth refresh token allows renewing the
/// Minecraft access token without user interaction.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct MicrosoftSession {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub uuid: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default)]
    pub app_id: String,
    #[serde(default)]
    pub redirect_uri: String,
    #[serde(default)]
    pub xuid: String,
    /// Profile name observed by the last failed validation, adopted by the
    /// next refresh without a network grant.
    #[serde(skip)]
    new_username: Option<String>,
}

impl MicrosoftSession {

    /// Build the URL the user's browser should be sent to in order to obtain
    /// an authorization code.
    pub fn authentication_url(app_id: &str, redirect_uri: &str, email: &str, nonce: &str) -> String {
        Url::parse_with_params(MS_AUTHORIZE_URL, [
            ("client_id", app_id),
            ("redirect_uri", redirect_uri),
            ("response_type", "code id_token"),
            ("scope", MS_SCOPE),
            ("login_hint", email),
            ("nonce", nonce),
            ("response_mode", "form_post"),
        ]).unwrap().to_string()
    }

    /// Build the URL logging the user out of the Microsoft account.
    pub fn logout_url(app_id: &str, redirect_uri: &str) -> String {
        Url::parse_with_params(MS_LOGOUT_URL, [
            ("client_id", app_id),
            ("redirect_uri", redirect_uri),
        ]).unwrap().to_string()
    }

    /// Verify that an OpenID token matches the nonce and email the
    /// authentication URL was built with.
    pub fn check_token_id(token_id: &str, email: &str, nonce: &str) -> bool {
        match decode_jwt_payload(token_id) {
            Some(payload) => {
                payload.get("nonce").and_then(Value::as_str) == Some(nonce)
                    && payload.get("email").and_then(Value::as_str) == Some(email)
            }
            None => false,
        }
    }

    /// Authenticate from an OAuth authorization code captured by the
    /// embedder's redirect URI.
    pub fn authenticate(client_id: String, app_id: &str, code: &str, redirect_uri: &str) -> Result<Self> {

        let tokens = request_minecraft_tokens(&[
            ("client_id", app_id),
            ("redirect_uri", redirect_uri),
            ("code", code),
            ("grant_type", "authorization_code"),
            ("scope", MS_SCOPE),
        ])?;

        let xuid = decode_jwt_payload(&tokens.access_token)
            .and_then(|payload| payload.get("xuid").and_then(Value::as_str).map(str::to_string))
            .unwrap_or_default();

        Ok(Self {
            access_token: tokens.access_token,
            username: tokens.username,
            uuid: tokens.uuid,
            client_id,
            refresh_token: tokens.refresh_token,
            app_id: app_id.to_string(),
            redirect_uri: redirect_uri.to_string(),
            xuid,
            new_username: None,
        })

    }

    /// A session is valid when the profile request succeeds and the profile
    /// name matches the stored one; a renamed profile fails validation but
    /// the new name is remembered so the next refresh adopts it for free.
    pub fn validate(&mut self) -> Result<bool> {

        self.new_username = None;

        let (status, res) = request_minecraft_profile(&self.access_token)?;
        if status != 200 {
            return Ok(false);
        }

        let username = extract_str(&res, &["name"])?;
        if username != self.username {
            self.new_username = Some(username);
            return Ok(false);
        }

        Ok(true)

    }

    /// Renew the session, either by adopting the profile name remembered by
    /// the last validation, or through the full refresh-token grant.
    pub fn refresh(&mut self) -> Result<()> {

        if let Some(username) = self.new_username.take() {
            self.username = username;
            return Ok(());
        }

        let tokens = request_minecraft_tokens(&[
            ("client_id", &self.app_id),
            ("redirect_uri", &self.redirect_uri),
            ("refresh_token", &self.refresh_token),
            ("grant_type", "refresh_token"),
            ("scope", MS_SCOPE),
        ])?;

        self.access_token = tokens.access_token;
        self.username = tokens.username;
        self.uuid = tokens.uuid;
        self.refresh_token = tokens.refresh_token;

        // The XUID is carried by the access token itself.
        if let Some(xuid) = decode_jwt_payload(&self.access_token)
            .and_then(|payload| payload.get("xuid").and_then(Value::as_str).map(str::to_string))
        {
            self.xuid = xuid;
        }

        Ok(())

    }

}

/// The product of the full OAuth-to-XBL-to-Minecraft exchange.
struct MinecraftTokens {
    refresh_token: String,
    access_token: String,
    username: String,
    uuid: String,
}

/// Run the multi-step Microsoft exchange from an OAuth grant (authorization
/// code or refresh token) down to the Minecraft profile.
fn request_minecraft_tokens(grant: &[(&str, &str)]) -> Result<MinecraftTokens> {

    // Step 1: OAuth token.
    let (status, res) = http::json_request(Method::POST, MS_TOKEN_URL, Body::Form(grant), None, true, None)?;
    if status != 200 {
        return Err(Error::Microsoft { details: error_details(&res) });
    }

    let ms_access_token = extract_str(&res, &["access_token"])?;
    let ms_refresh_token = res.get("refresh_token")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    // Step 2: Xbox Live user token.
    let (status, res) = http::json_request(Method::POST, XBL_USER_URL, Body::Json(&json!({
        "Properties": {
            "AuthMethod": "RPS",
            "SiteName": "user.auth.xboxlive.com",
            "RpsTicket": format!("d={ms_access_token}"),
        },
        "RelyingParty": "http://auth.xboxlive.com",
        "TokenType": "JWT",
    })), None, true, None)?;
    if status != 200 {
        return Err(Error::Microsoft { details: error_details(&res) });
    }

    let xbl_token = extract_str(&res, &["Token"])?;
    let user_hash = extract_str(&res, &["DisplayClaims", "xui", "0", "uhs"])?;

    // Step 3: XSTS token for the Minecraft services relying party.
    let (status, res) = http::json_request(Method::POST, XBL_XSTS_URL, Body::Json(&json!({
        "Properties": {
            "SandboxId": "RETAIL",
            "UserTokens": [xbl_token],
        },
        "RelyingParty": "rp://api.minecraftservices.com/",
        "TokenType": "JWT",
    })), None, true, None)?;
    if status != 200 {
        return Err(Error::Microsoft { details: error_details(&res) });
    }

    let xsts_token = extract_str(&res, &["Token"])?;
    if extract_str(&res, &["DisplayClaims", "xui", "0", "uhs"])? != user_hash {
        return Err(Error::MicrosoftInconsistentUserHash);
    }

    // Step 4: Minecraft services access token.
    let (status, res) = http::json_request(Method::POST, MC_LOGIN_URL, Body::Json(&json!({
        "identityToken": format!("XBL3.0 x={user_hash};{xsts_token}"),
    })), None, true, None)?;
    if status != 200 {
        return Err(Error::Microsoft { details: error_details(&res) });
    }

    let mc_access_token = extract_str(&res, &["access_token"])?;

    // Step 5: the actual player profile.
    let (status, res) = request_minecraft_profile(&mc_access_token)?;
    match status {
        404 => return Err(Error::MicrosoftDoesNotOwnMinecraft),
        401 => return Err(Error::MicrosoftOutdatedToken),
        200 if res.get("error").is_none() => (),
        _ => return Err(Error::Microsoft { details: error_details(&res) }),
    }

    Ok(MinecraftTokens {
        refresh_token: ms_refresh_token,
        access_token: mc_access_token,
        username: extract_str(&res, &["name"])?,
        uuid: extract_str(&res, &["id"])?,
    })

}

fn request_minecraft_profile(access_token: &str) -> Result<(u16, Value)> {
    Ok(http::json_request(Method::GET, MC_PROFILE_URL, Body::None, Some(access_token), true, None)?)
}

/// Extract the most relevant error message of a Microsoft-side error body.
fn error_details(res: &Value) -> String {
    for key in ["errorMessage", "error_description", "error", "Message"] {
        if let Some(details) = res.get(key).and_then(Value::as_str) {
            return details.to_string();
        }
    }
    "unknown error".to_string()
}

/// Descend a JSON document through the given path of keys (array items are
/// indexed by their decimal position) and expect a string leaf.
fn extract_str(value: &Value, path: &[&str]) -> Result<String> {

    let mut current = value;
    for key in path {
        let next = match current {
            Value::Array(items) => key.parse::<usize>().ok().and_then(|index| items.get(index)),
            _ => current.get(key),
        };
        let Some(next) = next else {
            return Err(Error::UnexpectedResponse { field: path.join(".") });
        };
        current = next;
    }

    match current {
        Value::String(s) => Ok(s.clone()),
        _ => Err(Error::UnexpectedResponse { field: path.join(".") }),
    }

}

/// Decode the payload (second segment) of a JWT without validating it, the
/// segment is base64url and padded to a multiple of four.
pub fn decode_jwt_payload(jwt: &str) -> Option<Value> {
    let mut payload = jwt.split('.').nth(1)?.to_string();
    while payload.len() % 4 != 0 {
        payload.push('=');
    }
    let bytes = URL_SAFE.decode(payload).ok()?;
    serde_json::from_slice(&bytes).ok()
}

/// Type alias for a result with the authentication error type.
pub type Result<T> = std::result::Result<T, Error>;

/// An authentication error, either reported by a server or structural.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The Yggdrasil server rejected the request with a message.
    #[error("yggdrasil: {message}")]
    Yggdrasil {
        message: String,
    },
    /// A step of the Microsoft exchange failed with the given details.
    #[error("microsoft: {details}")]
    Microsoft {
        details: String,
    },
    /// The XSTS user hash does not match the XBL one.
    #[error("microsoft: inconsistent user hash")]
    MicrosoftInconsistentUserHash,
    /// The Microsoft account does not own Minecraft.
    #[error("microsoft: does not own minecraft")]
    MicrosoftDoesNotOwnMinecraft,
    /// The Minecraft access token is no longer accepted.
    #[error("microsoft: outdated token")]
    MicrosoftOutdatedToken,
    /// A server answered without a field the flow requires.
    #[error("unexpected response: missing {field}")]
    UnexpectedResponse {
        field: String,
    },
    /// Error while requesting a JSON endpoint.
    #[error("request: {0}")]
    JsonRequest(#[from] JsonRequestError),
}

/// The persisted session database, a mapping from session kind and account
/// identifier (usually the email) to the stored session, plus the stable
/// per-installation client id.
///
/// The lifecycle is load, mutate through put/remove or by refreshing a
/// session taken out with [`Self::get`], then save explicitly.
#[derive(Debug)]
pub struct AuthDatabase {
    /// Path of the database file.
    file: PathBuf,
    /// Path of the legacy line-oriented file, imported once then deleted.
    legacy_file: PathBuf,
    /// The stable client id, regenerated by [`Self::get_client_id`] when
    /// missing or malformed.
    client_id: Option<String>,
    yggdrasil: HashMap<String, YggdrasilSession>,
    microsoft: HashMap<String, MicrosoftSession>,
}

impl AuthDatabase {

    /// Create a database handle over the given files, nothing is read yet.
    pub fn new(file: impl Into<PathBuf>, legacy_file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            legacy_file: legacy_file.into(),
            client_id: None,
            yggdrasil: HashMap::new(),
            microsoft: HashMap::new(),
        }
    }

    /// Create a database handle at the standard location inside the working
    /// directory of the given context.
    pub fn new_in_context(context: &crate::Context) -> Self {
        Self::new(
            context.work_dir.join(AUTH_DATABASE_NAME),
            context.work_dir.join(AUTH_DATABASE_LEGACY_NAME),
        )
    }

    /// Path of the database file.
    #[inline]
    pub fn file(&self) -> &Path {
        &self.file
    }

    /// Load the database from disk, replacing in-memory sessions. A missing
    /// or corrupt database file loads as empty, a one-shot import of the
    /// legacy file happens when no database file exists yet.
    pub fn load(&mut self) {

        self.yggdrasil.clear();
        self.microsoft.clear();

        if !self.file.is_file() {
            self.load_legacy_and_delete();
        }

        let Ok(reader) = File::open(&self.file) else { return };
        let Ok(mut data) = serde_json::from_reader::<_, Value>(BufReader::new(reader)) else { return };

        if let Some(client_id) = data.get("client_id").and_then(Value::as_str) {
            self.client_id = Some(client_id.to_string());
        }

        if let Some(sessions) = session_objects(&mut data, SessionKind::Yggdrasil) {
            for (account, session) in sessions {
                if let Some(session) = session.as_object_mut() {
                    fix_yggdrasil_data(session);
                }
                if let Ok(session) = serde_json::from_value(session.take()) {
                    self.yggdrasil.insert(account.clone(), session);
                }
            }
        }

        if let Some(sessions) = session_objects(&mut data, SessionKind::Microsoft) {
            for (account, session) in sessions {
                if let Some(session) = session.as_object_mut() {
                    fix_microsoft_data(session);
                }
                if let Ok(session) = serde_json::from_value(session.take()) {
                    self.microsoft.insert(account.clone(), session);
                }
            }
        }

    }

    /// Import the legacy line-oriented sessions file: five space-separated
    /// fields per line `email client_token username uuid access_token`. The
    /// file is deleted after a successful read.
    fn load_legacy_and_delete(&mut self) {

        let Ok(reader) = File::open(&self.legacy_file) else { return };

        for line in BufReader::new(reader).lines() {
            let Ok(line) = line else { return };
            let parts = line.split(' ').collect::<Vec<_>>();
            if let [account, client_id, username, uuid, access_token] = parts[..] {
                self.yggdrasil.insert(account.to_string(), YggdrasilSession {
                    access_token: access_token.trim_end().to_string(),
                    username: username.to_string(),
                    uuid: uuid.to_string(),
                    client_id: client_id.to_string(),
                });
            }
        }

        let _ = fs::remove_file(&self.legacy_file);

    }

    /// Save the database to disk, creating parent directories if needed.
    pub fn save(&self) -> io::Result<()> {

        if let Some(parent) = self.file.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut data = serde_json::Map::new();
        if let Some(client_id) = &self.client_id {
            data.insert("client_id".to_string(), Value::String(client_id.clone()));
        }

        if !self.yggdrasil.is_empty() {
            data.insert("yggdrasil".to_string(), json!({
                "sessions": self.yggdrasil,
            }));
        }

        if !self.microsoft.is_empty() {
            data.insert("microsoft".to_string(), json!({
                "sessions": self.microsoft,
            }));
        }

        let writer = File::create(&self.file)?;
        serde_json::to_writer_pretty(writer, &Value::Object(data))?;
        Ok(())

    }

    /// Get a copy of the stored session of the given kind and account.
    pub fn get(&self, kind: SessionKind, account: &str) -> Option<AuthSession> {
        match kind {
            SessionKind::Yggdrasil => self.yggdrasil.get(account)
                .cloned().map(AuthSession::Yggdrasil),
            SessionKind::Microsoft => self.microsoft.get(account)
                .cloned().map(AuthSession::Microsoft),
        }
    }

    /// Store a session for the given account, replacing any session of the
    /// same kind and account.
    pub fn put(&mut self, account: impl Into<String>, session: AuthSession) {
        match session {
            AuthSession::Yggdrasil(session) => { self.yggdrasil.insert(account.into(), session); }
            AuthSession::Microsoft(session) => { self.microsoft.insert(account.into(), session); }
        }
    }

    /// Remove and return the stored session of the given kind and account.
    pub fn remove(&mut self, kind: SessionKind, account: &str) -> Option<AuthSession> {
        match kind {
            SessionKind::Yggdrasil => self.yggdrasil.remove(account)
                .map(AuthSession::Yggdrasil),
            SessionKind::Microsoft => self.microsoft.remove(account)
                .map(AuthSession::Microsoft),
        }
    }

    /// Iterate over all stored sessions with their account identifier.
    pub fn sessions(&self) -> impl Iterator<Item = (&str, AuthSession)> + '_ {
        let yggdrasil = self.yggdrasil.iter()
            .map(|(account, session)| (account.as_str(), AuthSession::Yggdrasil(session.clone())));
        let microsoft = self.microsoft.iter()
            .map(|(account, session)| (account.as_str(), AuthSession::Microsoft(session.clone())));
        yggdrasil.chain(microsoft)
    }

    /// Return the stable client id of this installation, generating a fresh
    /// UUID when missing or malformed. The caller saves the database to make
    /// a fresh id durable.
    pub fn get_client_id(&mut self) -> &str {
        let valid = matches!(&self.client_id, Some(id) if id.len() == 36);
        if !valid {
            self.client_id = Some(Uuid::new_v4().to_string());
        }
        self.client_id.as_deref().unwrap()
    }

}

/// Get the mutable `sessions` object of a session kind in the raw database
/// document.
fn session_objects(data: &mut Value, kind: SessionKind) -> Option<&mut serde_json::Map<String, Value>> {
    data.get_mut(kind.as_str())?
        .get_mut("sessions")?
        .as_object_mut()
}

/// Migrate a raw Yggdrasil session from older database layouts.
fn fix_yggdrasil_data(data: &mut serde_json::Map<String, Value>) {
    // The client id used to be stored as 'client_token'.
    if let Some(client_token) = data.remove("client_token") {
        data.insert("client_id".to_string(), client_token);
    }
}

/// Migrate a raw Microsoft session from older database layouts.
fn fix_microsoft_data(data: &mut serde_json::Map<String, Value>) {

    // The application id used to be stored as 'client_id'.
    if !data.contains_key("app_id") {
        if let Some(client_id) = data.remove("client_id") {
            data.insert("app_id".to_string(), client_id);
        }
    }

    // Ensure a per-session client id.
    let client_id_empty = data.get("client_id")
        .and_then(Value::as_str)
        .map_or(true, str::is_empty);
    if client_id_empty {
        data.insert("client_id".to_string(), Value::String(Uuid::new_v4().to_string()));
    }

    // Backfill the XUID from the access token's JWT payload.
    if !data.contains_key("xuid") {
        let xuid = data.get("access_token")
            .and_then(Value::as_str)
            .and_then(decode_jwt_payload)
            .and_then(|payload| payload.get("xuid").and_then(Value::as_str).map(str::to_string));
        if let Some(xuid) = xuid {
            data.insert("xuid".to_string(), Value::String(xuid));
        }
    }

}
