use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "qr_code": "EMP-001",
        "full_name": "John Doe"
    })
)]
pub struct Employee {
    #[schema(example = 1)]
    pub id: i64,

    #[schema(example = "EMP-001")]
    pub qr_code: String,

    #[schema(example = "John Doe", nullable = true)]
    #[serde(default)]
    pub full_name: Option<String>,
}
