//! LINE Messaging API client for stock notifications
//!
//! Pushes text messages to the shop's LINE account when stock moves or
//! runs low. Sends are fire-and-forget: a failed push is logged and never
//! fails the inventory operation that triggered it.

use reqwest::Client;
use serde::Serialize;
use shared::Unit;

use crate::config::LineConfig;
use crate::error::{AppError, AppResult};

const LINE_PUSH_URL: &str = "https://api.line.me/v2/bot/message/push";

/// LINE Messaging API push client
#[derive(Clone)]
pub struct LineClient {
    client: Client,
    messaging_token: String,
    notify_user_id: String,
}

#[derive(Serialize)]
struct PushRequest<'a> {
    to: &'a str,
    messages: Vec<TextMessage<'a>>,
}

#[derive(Serialize)]
struct TextMessage<'a> {
    #[serde(rename = "type")]
    message_type: &'static str,
    text: &'a str,
}

impl LineClient {
    pub fn new(config: &LineConfig) -> Self {
        Self {
            client: Client::new(),
            messaging_token: config.messaging_token.clone(),
            notify_user_id: config.notify_user_id.clone(),
        }
    }

    /// Whether a channel token and recipient are configured
    pub fn is_enabled(&self) -> bool {
        !self.messaging_token.is_empty() && !self.notify_user_id.is_empty()
    }

    /// Push a text message to the configured recipient
    pub async fn send_text_message(&self, text: &str) -> AppResult<()> {
        let body = PushRequest {
            to: &self.notify_user_id,
            messages: vec![TextMessage {
                message_type: "text",
                text,
            }],
        };

        let response = self
            .client
            .post(LINE_PUSH_URL)
            .bearer_auth(&self.messaging_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::LineApiError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::LineApiError(format!("{}: {}", status, detail)));
        }

        Ok(())
    }

    /// Notify that stock was received
    pub async fn notify_stock_in(&self, name: &str, code: &str, qty: i32, unit: Unit) {
        let message = format!(
            "✅ รับสินค้าเข้าสต็อก\n\n📦 สินค้า: {}\n🔖 รหัส: {}\n📥 จำนวน: {} {}\n\nบันทึกเรียบร้อยแล้ว",
            name,
            code,
            qty,
            unit.label_th()
        );
        self.push_best_effort(&message).await;
    }

    /// Notify that stock was issued
    pub async fn notify_stock_out(&self, name: &str, code: &str, qty: i32, unit: Unit, issued_by: &str) {
        let message = format!(
            "📤 เบิกสินค้าออก\n\n📦 สินค้า: {}\n🔖 รหัส: {}\n📤 จำนวน: {} {}\n👤 ผู้เบิก: {}\n\nบันทึกเรียบร้อยแล้ว",
            name,
            code,
            qty,
            unit.label_th(),
            issued_by
        );
        self.push_best_effort(&message).await;
    }

    /// Warn that a product is running low
    pub async fn notify_low_stock(&self, name: &str, code: &str, stock: i32, unit: Unit) {
        let message = format!(
            "⚠️ แจ้งเตือน: สินค้าใกล้หมด!\n\n📦 สินค้า: {}\n🔖 รหัส: {}\n📊 คงเหลือ: {} {}\n\nกรุณาเติมสินค้าโดยเร็ว!",
            name,
            code,
            stock,
            unit.label_th()
        );
        self.push_best_effort(&message).await;
    }

    /// Warn that a product is out of stock
    pub async fn notify_out_of_stock(&self, name: &str, code: &str) {
        let message = format!(
            "🚨 แจ้งเตือน: สินค้าหมดสต็อก!\n\n📦 สินค้า: {}\n🔖 รหัส: {}\n\n⚡ จำเป็นต้องเติมสต็อกด่วน!",
            name, code
        );
        self.push_best_effort(&message).await;
    }

    async fn push_best_effort(&self, message: &str) {
        if !self.is_enabled() {
            return;
        }
        if let Err(e) = self.send_text_message(message).await {
            tracing::warn!("LINE notification failed: {}", e);
        }
    }
}
