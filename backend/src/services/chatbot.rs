//! WhatsApp assistant dispatcher
//!
//! Each inbound text goes through a fixed priority:
//! - greeting: static introduction
//! - commodity question: PSD data, or the assistant when none is found
//! - weather question: 5-day forecast (image first when stored), or the assistant
//! - anything else: the assistant
//!
//! Messages are handled independently; nothing is remembered between them.

use serde::{Deserialize, Serialize};
use shared::Intent;
use std::path::PathBuf;
use std::sync::Arc;

use super::commodity::{CommodityReply, CommodityService};
use super::intent;
use super::weather::{WeatherReply, WeatherService};
use crate::error::AppResult;
use crate::external::{LlmCompletion, MessageTransport};

/// Sent when anything goes wrong while answering
pub const APOLOGY: &str =
    "Desculpe, ocorreu um erro ao processar sua mensagem. Tente novamente em alguns instantes.";

/// Characters of each reply written to the log
const LOG_PREVIEW_CHARS: usize = 100;

/// WhatsApp webhook request body
/// See: https://developers.facebook.com/docs/whatsapp/cloud-api/webhooks/payload-examples
#[derive(Debug, Deserialize)]
pub struct WhatsAppWebhookRequest {
    /// Always "whatsapp_business_account" for message notifications
    pub object: String,
    #[serde(default)]
    pub entry: Vec<WhatsAppEntry>,
}

#[derive(Debug, Deserialize)]
pub struct WhatsAppEntry {
    pub id: Option<String>,
    #[serde(default)]
    pub changes: Vec<WhatsAppChange>,
}

#[derive(Debug, Deserialize)]
pub struct WhatsAppChange {
    pub field: Option<String>,
    pub value: WhatsAppChangeValue,
}

#[derive(Debug, Deserialize)]
pub struct WhatsAppChangeValue {
    pub messaging_product: Option<String>,
    pub metadata: Option<WhatsAppMetadata>,
    #[serde(default)]
    pub contacts: Vec<WhatsAppContact>,
    /// Absent for status notifications (sent, delivered, read)
    #[serde(default)]
    pub messages: Vec<WhatsAppMessage>,
}

#[derive(Debug, Deserialize)]
pub struct WhatsAppMetadata {
    pub display_phone_number: Option<String>,
    pub phone_number_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WhatsAppContact {
    pub profile: Option<WhatsAppProfile>,
    pub wa_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WhatsAppProfile {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WhatsAppMessage {
    pub from: String,
    pub id: Option<String>,
    pub timestamp: Option<String>,
    #[serde(rename = "type")]
    pub message_type: String,
    pub text: Option<WhatsAppText>,
}

#[derive(Debug, Deserialize)]
pub struct WhatsAppText {
    pub body: String,
}

/// A text message worth answering
#[derive(Debug, Clone, PartialEq)]
pub struct InboundText {
    pub from: String,
    pub sender_name: String,
    pub body: String,
}

/// Everything sent back for one message
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reply {
    pub intent: Intent,
    pub text: String,
    /// Sent before the text when present
    pub image: Option<PathBuf>,
}

impl Reply {
    fn text(intent: Intent, text: String) -> Self {
        Self {
            intent,
            text,
            image: None,
        }
    }
}

/// Assistant settings for free-form replies
#[derive(Debug, Clone)]
pub struct AssistantSettings {
    pub bot_name: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Clone)]
pub struct ChatbotService {
    own_phone_number_id: String,
    settings: AssistantSettings,
    commodities: CommodityService,
    weather: WeatherService,
    assistant: Arc<dyn LlmCompletion>,
}

impl ChatbotService {
    pub fn new(
        own_phone_number_id: impl Into<String>,
        settings: AssistantSettings,
        commodities: CommodityService,
        weather: WeatherService,
        assistant: Arc<dyn LlmCompletion>,
    ) -> Self {
        Self {
            own_phone_number_id: own_phone_number_id.into(),
            settings,
            commodities,
            weather,
            assistant,
        }
    }

    /// Text messages from a webhook notification, minus our own echoes,
    /// non-text messages and blank bodies
    pub fn inbound_texts(&self, request: &WhatsAppWebhookRequest) -> Vec<InboundText> {
        if request.object != "whatsapp_business_account" {
            tracing::debug!("Ignoring webhook for object {}", request.object);
            return Vec::new();
        }

        let mut inbound = Vec::new();
        for change in request.entry.iter().flat_map(|e| e.changes.iter()) {
            let sender_name = change
                .value
                .contacts
                .first()
                .and_then(|c| c.profile.as_ref())
                .and_then(|p| p.name.clone());

            for message in &change.value.messages {
                if message.from == self.own_phone_number_id {
                    continue;
                }
                if message.message_type != "text" {
                    tracing::debug!("Skipping {} message from {}", message.message_type, message.from);
                    continue;
                }
                let body = message
                    .text
                    .as_ref()
                    .map(|t| t.body.clone())
                    .unwrap_or_default();
                if body.trim().is_empty() {
                    continue;
                }

                inbound.push(InboundText {
                    from: message.from.clone(),
                    sender_name: sender_name.clone().unwrap_or_else(|| message.from.clone()),
                    body,
                });
            }
        }
        inbound
    }

    /// Answer one message and deliver the answer. Never fails: errors are
    /// turned into a best-effort apology.
    pub async fn handle_message(&self, message: &InboundText, transport: &dyn MessageTransport) {
        tracing::info!("👤 {}: {}", message.sender_name, message.body);

        let delivered = match self.reply_for(&message.body).await {
            Ok(reply) => self.deliver(&message.from, &reply, transport).await.map(|_| reply),
            Err(e) => Err(e),
        };

        match delivered {
            Ok(reply) => tracing::info!("🤖 Bot: {}", preview(&reply.text)),
            Err(e) => {
                tracing::error!("Failed to process message from {}: {}", message.from, e);
                if let Err(send_err) = transport.send_text(&message.from, APOLOGY).await {
                    tracing::debug!("Apology to {} not delivered: {}", message.from, send_err);
                }
            }
        }
    }

    /// Build the reply for a message without sending anything
    pub async fn reply_for(&self, text: &str) -> AppResult<Reply> {
        let intent = intent::classify(text);
        tracing::debug!("Message classified as {:?}", intent);

        match intent {
            Intent::Greeting => Ok(Reply::text(intent, self.introduction())),
            Intent::CommodityQuery => match self.commodities.answer(text).await {
                Some(CommodityReply::Found(summary)) => Ok(Reply::text(intent, summary)),
                Some(CommodityReply::Unavailable { diagnostic }) => {
                    tracing::debug!("Commodity lookup unavailable: {}", preview(&diagnostic));
                    self.assistant_reply(intent, text).await
                }
                None => self.assistant_reply(intent, text).await,
            },
            Intent::WeatherQuery => match self.weather.answer(text).await {
                Some(WeatherReply::Forecast { text: forecast, image }) => Ok(Reply {
                    intent,
                    text: forecast,
                    image,
                }),
                Some(WeatherReply::Unavailable { notice }) => {
                    tracing::debug!("Weather lookup unavailable: {}", notice);
                    self.assistant_reply(intent, text).await
                }
                None => self.assistant_reply(intent, text).await,
            },
            Intent::General => self.assistant_reply(intent, text).await,
        }
    }

    async fn deliver(&self, to: &str, reply: &Reply, transport: &dyn MessageTransport) -> AppResult<()> {
        if let Some(image) = &reply.image {
            transport.send_image(to, image, None).await?;
        }
        transport.send_text(to, &reply.text).await
    }

    async fn assistant_reply(&self, intent: Intent, text: &str) -> AppResult<Reply> {
        let answer = self
            .assistant
            .complete(
                &self.system_context(),
                text,
                self.settings.max_tokens,
                self.settings.temperature,
            )
            .await?;
        Ok(Reply::text(intent, answer))
    }

    /// Static introduction sent in reply to a bare greeting
    pub fn introduction(&self) -> String {
        format!(
            "👋 Olá! Eu sou o {name}, seu assistente virtual especializado em dados agrícolas e commodities.\n\
             \n\
             📊 Posso te ajudar com:\n\
             \n\
             🌾 **Dados de Commodities**\n\
             \x20  • \"Quais são os dados do milho?\"\n\
             \x20  • \"Dados da soja\"\n\
             \x20  • \"Informações sobre produção de milho\"\n\
             \n\
             🌤️ **Previsão do Tempo**\n\
             \x20  • \"Qual o clima em São Paulo?\"\n\
             \x20  • \"Como está o tempo em [cidade]?\"\n\
             \x20  • \"Previsão do tempo para [cidade]\"\n\
             \n\
             💬 **Outras Perguntas**\n\
             \x20  • Qualquer dúvida sobre agricultura, commodities ou outros assuntos!\n\
             \n\
             Como posso te ajudar hoje? 😊",
            name = self.settings.bot_name
        )
    }

    /// Persona for free-form replies
    pub fn system_context(&self) -> String {
        format!(
            "Você é o {name}, um assistente virtual especializado em dados agrícolas e commodities.\n\
             \n\
             IDENTIDADE:\n\
             - Nome: {name}\n\
             - Especialidade: Análise de dados agrícolas, commodities e mercado agropecuário\n\
             - Personalidade: Profissional, amigável, prestativo e acessível\n\
             - Tom: Educado, claro e objetivo, mas também caloroso e humano\n\
             \n\
             CAPACIDADES:\n\
             - Você tem acesso à API USDA PSD (Production, Supply and Distribution) para fornecer dados atualizados sobre commodities agrícolas\n\
             - Pode responder perguntas sobre: milho, soja, trigo, café, algodão, açúcar, arroz e outras commodities\n\
             - Quando perguntado sobre dados de commodities, você busca informações reais e atualizadas da API\n\
             - Você também pode responder perguntas gerais sobre agricultura, mercado agrícola e commodities\n\
             \n\
             FORMATO DE RESPOSTAS:\n\
             - Seja conciso e direto (conversas via WhatsApp são breves)\n\
             - Use emojis de forma moderada e profissional quando apropriado\n\
             - Sempre responda em português brasileiro\n\
             - Se não souber algo, seja honesto e sugira onde o usuário pode encontrar a informação\n\
             - Quando mencionar dados de commodities, sempre cite a fonte (USDA PSD Database)\n\
             \n\
             COMPORTAMENTO:\n\
             - Seja prestativo e proativo\n\
             - Se o usuário perguntar sobre dados de commodities que você não tem acesso, explique que pode buscar dados atualizados\n\
             - Mantenha um tom profissional mas acessível\n\
             - Adapte o nível técnico da resposta ao contexto da pergunta\n\
             - Seja empático e compreensivo\n\
             \n\
             IMPORTANTE:\n\
             - Nunca invente dados ou estatísticas\n\
             - Se não tiver certeza sobre algo, seja transparente\n\
             - Sempre priorize informações precisas e atualizadas",
            name = self.settings.bot_name
        )
    }
}

fn preview(text: &str) -> String {
    if text.chars().count() > LOG_PREVIEW_CHARS {
        let head: String = text.chars().take(LOG_PREVIEW_CHARS).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}
