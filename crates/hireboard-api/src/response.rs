//! Uniform JSON success envelope.

use serde::Serialize;

use hireboard_store::Page;

/// Pagination metadata attached to list responses.
#[derive(Debug, Clone, Serialize)]
pub struct Pagination {
    /// Count of all matching records ignoring pagination.
    pub total: u64,
    pub page: u32,
    /// `ceil(total / size)`.
    pub pages: u32,
}

/// Success envelope: `{success, message?, data?, pagination?}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
            pagination: None,
        }
    }

    pub fn ok_with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
            pagination: None,
        }
    }

    /// Envelope a page of items, lifting its metadata into `pagination`.
    pub fn paged(page: Page<T>) -> ApiResponse<Vec<T>> {
        ApiResponse {
            success: true,
            message: None,
            data: Some(page.items),
            pagination: Some(Pagination {
                total: page.total,
                page: page.page,
                pages: page.pages,
            }),
        }
    }
}

impl ApiResponse<()> {
    /// Message-only envelope (logout, deletions).
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
            pagination: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hireboard_store::PageRequest;
    use serde_json::json;

    #[test]
    fn ok_envelope_omits_absent_fields() {
        let envelope = ApiResponse::ok(json!({"id": "a"}));
        let rendered = serde_json::to_value(&envelope).unwrap();
        assert_eq!(rendered, json!({"success": true, "data": {"id": "a"}}));
    }

    #[test]
    fn paged_envelope_carries_pagination() {
        let page = Page::new(vec![1u32, 2, 3], 23, PageRequest::new(Some(2), Some(10)));
        let envelope = ApiResponse::paged(page);
        let rendered = serde_json::to_value(&envelope).unwrap();
        assert_eq!(
            rendered,
            json!({
                "success": true,
                "data": [1, 2, 3],
                "pagination": {"total": 23, "page": 2, "pages": 3}
            })
        );
    }

    #[test]
    fn message_envelope_has_no_data() {
        let envelope = ApiResponse::message("Logged out successfully");
        let rendered = serde_json::to_value(&envelope).unwrap();
        assert_eq!(
            rendered,
            json!({"success": true, "message": "Logged out successfully"})
        );
    }
}
