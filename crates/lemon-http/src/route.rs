//! Route - HTTP method plus a path template with `{name}` placeholders

use std::fmt;

use reqwest::Method;

use crate::error::{HttpError, HttpResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    method: Method,
    template: &'static str,
}

/// A route with every placeholder filled in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledRoute {
    pub method: Method,
    pub path: String,
}

impl Route {
    pub const fn new(method: Method, template: &'static str) -> Self {
        Self { method, template }
    }

    pub const fn get(template: &'static str) -> Self {
        Self::new(Method::GET, template)
    }

    pub const fn post(template: &'static str) -> Self {
        Self::new(Method::POST, template)
    }

    pub const fn put(template: &'static str) -> Self {
        Self::new(Method::PUT, template)
    }

    pub const fn patch(template: &'static str) -> Self {
        Self::new(Method::PATCH, template)
    }

    pub const fn delete(template: &'static str) -> Self {
        Self::new(Method::DELETE, template)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn template(&self) -> &'static str {
        self.template
    }

    /// Substitute `params` into the template. Extra params are ignored.
    pub fn compile(&self, params: &[(&str, String)]) -> HttpResult<CompiledRoute> {
        let mut path = String::with_capacity(self.template.len() + 32);
        let mut rest = self.template;

        while let Some(open) = rest.find('{') {
            path.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let Some(close) = after.find('}') else {
                // unbalanced brace, keep it literally
                path.push_str(&rest[open..]);
                rest = "";
                break;
            };
            let name = &after[..close];
            let value = params
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| value)
                .ok_or_else(|| HttpError::MissingParam(name.to_string()))?;
            path.push_str(value);
            rest = &after[close + 1..];
        }
        path.push_str(rest);

        Ok(CompiledRoute {
            method: self.method.clone(),
            path,
        })
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.template)
    }
}

// Endpoints used by the typed helpers
pub(crate) const GATEWAY: Route = Route::get("/gateway");
pub(crate) const GATEWAY_BOT: Route = Route::get("/gateway/bot");
pub(crate) const CURRENT_USER: Route = Route::get("/users/@me");
pub(crate) const CHANNEL: Route = Route::get("/channels/{channel_id}");
pub(crate) const CHANNEL_TYPING: Route = Route::post("/channels/{channel_id}/typing");
pub(crate) const CHANNEL_MESSAGES: Route = Route::get("/channels/{channel_id}/messages");
pub(crate) const CREATE_MESSAGE: Route = Route::post("/channels/{channel_id}/messages");
pub(crate) const MESSAGE: Route = Route::get("/channels/{channel_id}/messages/{message_id}");
pub(crate) const EDIT_MESSAGE: Route = Route::patch("/channels/{channel_id}/messages/{message_id}");
pub(crate) const DELETE_MESSAGE: Route =
    Route::delete("/channels/{channel_id}/messages/{message_id}");
pub(crate) const BULK_DELETE: Route = Route::post("/channels/{channel_id}/messages/bulk-delete");
pub(crate) const OWN_REACTION: Route =
    Route::put("/channels/{channel_id}/messages/{message_id}/reactions/{emoji}/@me");
pub(crate) const DELETE_OWN_REACTION: Route =
    Route::delete("/channels/{channel_id}/messages/{message_id}/reactions/{emoji}/@me");
pub(crate) const GUILD: Route = Route::get("/guilds/{guild_id}");
pub(crate) const GUILD_ROLES: Route = Route::get("/guilds/{guild_id}/roles");
pub(crate) const GUILD_MEMBER: Route = Route::get("/guilds/{guild_id}/members/{user_id}");
pub(crate) const ADD_MEMBER_ROLE: Route =
    Route::put("/guilds/{guild_id}/members/{user_id}/roles/{role_id}");
pub(crate) const REMOVE_MEMBER_ROLE: Route =
    Route::delete("/guilds/{guild_id}/members/{user_id}/roles/{role_id}");
