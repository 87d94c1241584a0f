//! Device tools - actions the phone performs after reading the answer

use async_trait::async_trait;

use crate::agent::{Context, Metadata};

use super::{find_similar, Arguments, FrontendCapability, Parameter, Tool, ToolError, ToolResult, Toolkit};

/// Minimum similarity between a spoken app name and a package name
pub const APP_MATCH_THRESHOLD: f64 = 0.5;

/// Minimum similarity between a spoken name and a contact name
pub const CONTACT_MATCH_THRESHOLD: f64 = 0.2;

const WHATSAPP_URL: &str = "https://api.whatsapp.com/send";
const YOUTUBE_URL: &str = "https://www.youtube.com/results";

/// Last dot-separated segment of a package id, lowercased
fn package_name(package: &str) -> String {
    package.rsplit('.').next().unwrap_or(package).to_lowercase()
}

fn encode(text: &str) -> String {
    url::form_urlencoded::byte_serialize(text.as_bytes()).collect()
}

/// Resolve a spoken application name to an installed package id
pub fn find_application(origin: &str, metadata: &Metadata, app_name: &str) -> Result<String, ToolError> {
    if metadata.installed_apps.is_empty() {
        return Err(ToolError::new(origin, "No applications installed on the user's device."));
    }

    let key = app_name.to_lowercase();
    match find_similar(metadata.installed_apps.iter().map(String::as_str), &key, package_name) {
        Some((app, score)) if score > APP_MATCH_THRESHOLD => Ok(app.to_string()),
        _ => Err(ToolError::new(
            origin,
            format!("No application similar to {app_name} was found."),
        )),
    }
}

/// Resolve a spoken contact name to a phone number
fn find_phone_number(origin: &str, metadata: &Metadata, to: &str) -> Result<String, ToolError> {
    if metadata.contacts.is_empty() {
        return Err(ToolError::new(origin, "No contacts found on the user's device"));
    }

    let key = to.to_lowercase();
    let (contact, _) = find_similar(metadata.contacts.keys().map(String::as_str), &key, str::to_lowercase)
        .filter(|(_, score)| *score > CONTACT_MATCH_THRESHOLD)
        .ok_or_else(|| ToolError::new(origin, format!("No contact similar to {to} was found.")))?;

    metadata
        .contacts
        .get(contact)
        .cloned()
        .flatten()
        .filter(|phone| !phone.is_empty())
        .ok_or_else(|| {
            ToolError::new(
                origin,
                format!("Contact {contact} has no phone number associated to it."),
            )
        })
}

/// Open an installed application
pub struct OpenApplicationTool;

#[async_trait]
impl Tool for OpenApplicationTool {
    fn name(&self) -> &str { "open_application" }

    fn description(&self) -> &str {
        "Opens the application on the user's phone (e.g. YouTube, Whatsapp, etc...). \
         NOTE: Only use this tool if the user **explicitely** asks for an app to be opened."
    }

    fn parameters(&self) -> &[Parameter] {
        const PARAMS: &[Parameter] = &[Parameter::string(
            "application_name",
            "The name of the application that needs to be opened (e.g. YouTube, Whatsapp, etc...)",
        )];
        PARAMS
    }

    async fn execute(&self, args: Arguments, ctx: &Context) -> ToolResult {
        let name = args.str("application_name");
        if name.is_empty() {
            return Err(ToolError::new(self.name(), "No application name provided."));
        }

        let app = find_application(self.name(), ctx.metadata(), name)?;
        Ok(FrontendCapability::open_app(&app).into_value())
    }
}

/// Prepare a WhatsApp message; the user still has to send it
pub struct SendWhatsappMessageTool;

#[async_trait]
impl Tool for SendWhatsappMessageTool {
    fn name(&self) -> &str { "send_whatsapp_message" }

    fn description(&self) -> &str {
        "Sends a WhatsApp message to a contact. \
         NOTE: Only use this tool if the user **explicitely** asks for a message to be sent to a contact. \
         IMPORTANT: This tool only prepares the message to be sent. It is only sent if the user approves the action."
    }

    fn parameters(&self) -> &[Parameter] {
        const PARAMS: &[Parameter] = &[
            Parameter::string("to", "The name of the contact that the user wants to send a message to"),
            Parameter::string("message", "The message to send to the contact"),
        ];
        PARAMS
    }

    async fn execute(&self, args: Arguments, ctx: &Context) -> ToolResult {
        let to = args.str("to");
        if to.is_empty() {
            return Err(ToolError::new(self.name(), "No recipient provided."));
        }

        let message = args.str("message");
        if message.is_empty() {
            return Err(ToolError::new(
                self.name(),
                "No message to send to recipient was provided.",
            ));
        }

        let metadata = ctx.metadata();
        let app = find_application(self.name(), metadata, "WhatsApp")?;
        let phone = find_phone_number(self.name(), metadata, to)?;

        let url = format!("{WHATSAPP_URL}?phone={phone}&text={}", encode(message));
        Ok(FrontendCapability::open_app_with_intent(&app, &url).into_value())
    }
}

/// Open the YouTube search results for a query
pub struct SearchOnYoutubeTool;

#[async_trait]
impl Tool for SearchOnYoutubeTool {
    fn name(&self) -> &str { "search_on_youtube" }

    fn description(&self) -> &str {
        "Searches for videos on the YouTube app. \
         NOTE: Only use this tool if the user **explicitely** asks you to search for something on YouTube."
    }

    fn parameters(&self) -> &[Parameter] {
        const PARAMS: &[Parameter] = &[Parameter::string(
            "search_query",
            "The thing the user wants to search for on YouTube",
        )];
        PARAMS
    }

    async fn execute(&self, args: Arguments, ctx: &Context) -> ToolResult {
        let query = args.str("search_query");
        if query.is_empty() {
            return Err(ToolError::new(self.name(), "No search query provided"));
        }

        let app = find_application(self.name(), ctx.metadata(), "YouTube")?;
        let url = format!("{YOUTUBE_URL}?search_query={}", encode(query));
        Ok(FrontendCapability::open_app_with_intent(&app, &url).into_value())
    }
}

pub fn toolkit() -> Toolkit {
    Toolkit::new("device")
        .with(OpenApplicationTool)
        .with(SendWhatsappMessageTool)
        .with(SearchOnYoutubeTool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::ToolCall;
    use crate::tools::ToolRegistry;
    use serde_json::{json, Value};

    fn phone() -> Metadata {
        Metadata::default()
            .with_app("com.whatsapp")
            .with_app("com.google.android.youtube")
            .with_contact("John Doe", "+99012345678")
    }

    async fn run(tool: &str, args: Value, metadata: Metadata) -> Value {
        let registry = ToolRegistry::from_toolkits(&[toolkit()]);
        let ctx = Context::new(metadata);
        registry.dispatch(&ToolCall::new(tool, args), &ctx).await.unwrap()
    }

    #[tokio::test]
    async fn test_open_application_matches_package() {
        let result = run("open_application", json!({"application_name": "YouTube"}), phone()).await;
        assert_eq!(
            result,
            json!({
                "archetype": "frontend-capability",
                "kind": "open-app",
                "data": {"url": "com.google.android.youtube"}
            })
        );
    }

    #[tokio::test]
    async fn test_open_application_below_threshold() {
        let result = run("open_application", json!({"application_name": "Excel"}), phone()).await;
        assert_eq!(result["error"], json!("agent-tool-error"));
        assert_eq!(result["origin"], json!("open_application"));
        assert_eq!(result["message"], json!("No application similar to Excel was found."));
    }

    #[tokio::test]
    async fn test_open_application_no_apps() {
        let result = run("open_application", json!({"application_name": "YouTube"}), Metadata::default()).await;
        assert_eq!(result["message"], json!("No applications installed on the user's device."));
    }

    #[tokio::test]
    async fn test_send_whatsapp_message() {
        let result = run(
            "send_whatsapp_message",
            json!({"to": "John", "message": "hi there & bye"}),
            phone(),
        )
        .await;

        assert_eq!(result["kind"], json!("open-app-with-intent"));
        assert_eq!(result["data"]["package"], json!("com.whatsapp"));
        assert_eq!(
            result["data"]["url"],
            json!("https://api.whatsapp.com/send?phone=+99012345678&text=hi+there+%26+bye")
        );
    }

    #[tokio::test]
    async fn test_send_whatsapp_empty_message_fails_first() {
        // no apps or contacts either, the message check must win
        let result = run("send_whatsapp_message", json!({"to": "John", "message": ""}), Metadata::default()).await;
        assert_eq!(result["message"], json!("No message to send to recipient was provided."));
    }

    #[tokio::test]
    async fn test_send_whatsapp_contact_without_number() {
        let mut metadata = phone();
        metadata.contacts.clear();
        metadata.contacts.insert("Jane".to_string(), None);

        let result = run("send_whatsapp_message", json!({"to": "jane", "message": "hi"}), metadata).await;
        assert_eq!(result["message"], json!("Contact Jane has no phone number associated to it."));
    }

    #[tokio::test]
    async fn test_send_whatsapp_no_contacts() {
        let metadata = Metadata::default().with_app("com.whatsapp");
        let result = run("send_whatsapp_message", json!({"to": "John", "message": "hi"}), metadata).await;
        assert_eq!(result["message"], json!("No contacts found on the user's device"));
    }

    #[tokio::test]
    async fn test_search_on_youtube() {
        let result = run("search_on_youtube", json!({"search_query": "lofi beats"}), phone()).await;
        assert_eq!(result["data"]["package"], json!("com.google.android.youtube"));
        assert_eq!(
            result["data"]["url"],
            json!("https://www.youtube.com/results?search_query=lofi+beats")
        );
    }

    #[tokio::test]
    async fn test_search_on_youtube_missing_query() {
        let result = run("search_on_youtube", json!({}), phone()).await;
        assert_eq!(result["error"], json!("agent-tool-error"));
        assert_eq!(result["message"], json!("Missing required argument 'search_query'."));
    }
}
