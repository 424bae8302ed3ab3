use serde::Serialize;

/// Contacto del admin para el widget de soporte
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminContactResponse {
    pub id: String,
    pub name: String,
}

/// Entrada del listado de conversaciones (vista admin): usuario + último mensaje
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatListEntry {
    pub id: String,
    pub name: String,
    pub email: String,
    pub last_message: String,
    pub last_timestamp: String,
}
