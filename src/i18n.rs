//! Arabic/English message catalogue.
//!
//! The core only deals in [`Message`] values and rule codes; text is
//! produced at the HTTP boundary for the caller's [`Locale`].

use crate::domain::EntityKind;
use axum::http::{header::ACCEPT_LANGUAGE, HeaderMap};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Ar,
    En,
}

impl FromStr for Locale {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_ascii_lowercase();
        if tag.starts_with("ar") {
            Ok(Self::Ar)
        } else if tag.starts_with("en") {
            Ok(Self::En)
        } else {
            Err(())
        }
    }
}

impl Locale {
    /// Picks the recognised language with the highest `q` weight in
    /// `Accept-Language`; ties go to the one listed first.
    pub fn negotiate(headers: &HeaderMap, fallback: Locale) -> Locale {
        let Some(value) = headers.get(ACCEPT_LANGUAGE).and_then(|v| v.to_str().ok()) else {
            return fallback;
        };
        let mut best: Option<(Locale, f32)> = None;
        for part in value.split(',') {
            let mut pieces = part.split(';');
            let Some(locale) = pieces.next().and_then(|tag| tag.parse::<Locale>().ok()) else {
                continue;
            };
            let weight = pieces
                .find_map(|p| p.trim().strip_prefix("q="))
                .map_or(Some(1.0), |q| q.trim().parse::<f32>().ok())
                .unwrap_or(0.0);
            if weight > 0.0 && best.map_or(true, |(_, w)| weight > w) {
                best = Some((locale, weight));
            }
        }
        best.map_or(fallback, |(locale, _)| locale)
    }
}

/// Outcome messages returned to the presentation layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Message {
    Created(EntityKind),
    Updated(EntityKind),
    Deleted(EntityKind),
    StatusChanged(EntityKind),
    NotFound(EntityKind),
    ValidationFailed,
    InvalidVariantData,
    EmailTaken,
    CustomerFieldsMissing,
    OrderCreationFailed,
    SaveFailed,
    DeleteFailed,
}

impl Message {
    pub fn text(self, locale: Locale) -> String {
        match locale {
            Locale::En => self.english(),
            Locale::Ar => self.arabic(),
        }
    }

    fn english(self) -> String {
        match self {
            Self::Created(kind) => format!("{} created successfully", capitalized(kind)),
            Self::Updated(kind) => format!("{} updated successfully", capitalized(kind)),
            Self::Deleted(kind) => format!("{} deleted successfully", capitalized(kind)),
            Self::StatusChanged(kind) => format!("{} status changed", capitalized(kind)),
            Self::NotFound(kind) => format!("{} not found", capitalized(kind)),
            Self::ValidationFailed => "Please correct the highlighted fields".into(),
            Self::InvalidVariantData => "Invalid variant data".into(),
            Self::EmailTaken => "This email is already registered".into(),
            Self::CustomerFieldsMissing => "Customer name and phone are required".into(),
            Self::OrderCreationFailed => "Failed to create order".into(),
            Self::SaveFailed => "Failed to save changes".into(),
            Self::DeleteFailed => "Failed to delete".into(),
        }
    }

    fn arabic(self) -> String {
        match self {
            Self::Created(kind) => format!("تم إنشاء {} بنجاح", arabic_noun(kind)),
            Self::Updated(kind) => format!("تم تحديث {} بنجاح", arabic_noun(kind)),
            Self::Deleted(kind) => format!("تم حذف {} بنجاح", arabic_noun(kind)),
            Self::StatusChanged(kind) => format!("تم تغيير حالة {}", arabic_noun(kind)),
            Self::NotFound(kind) => format!("لم يتم العثور على {}", arabic_noun(kind)),
            Self::ValidationFailed => "يرجى تصحيح الحقول المحددة".into(),
            Self::InvalidVariantData => "بيانات الخيارات غير صالحة".into(),
            Self::EmailTaken => "البريد الإلكتروني مسجل مسبقاً".into(),
            Self::CustomerFieldsMissing => "اسم العميل ورقم الهاتف مطلوبان".into(),
            Self::OrderCreationFailed => "فشل إنشاء الطلب".into(),
            Self::SaveFailed => "فشل حفظ التغييرات".into(),
            Self::DeleteFailed => "فشل الحذف".into(),
        }
    }
}

fn capitalized(kind: EntityKind) -> String {
    let name = kind.to_string();
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => name,
    }
}

fn arabic_noun(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Customer => "العميل",
        EntityKind::Product => "المنتج",
        EntityKind::Variant => "الخيار",
        EntityKind::DeliveryCompany => "شركة التوصيل",
        EntityKind::Order => "الطلب",
        EntityKind::User => "المستخدم",
    }
}

/// Text for a validation rule code. Unknown codes fall back to a
/// generic "invalid value".
pub fn rule_text(code: &str, locale: Locale) -> &'static str {
    let (en, ar) = match code {
        "required" => ("This field is required", "هذا الحقل مطلوب"),
        "name_too_short" => (
            "Name must be at least 2 characters",
            "يجب أن يتكون الاسم من حرفين على الأقل",
        ),
        "phone_too_short" => (
            "Phone number must contain at least 9 digits",
            "يجب أن يحتوي رقم الهاتف على 9 أرقام على الأقل",
        ),
        "email_invalid" => ("Invalid email address", "البريد الإلكتروني غير صالح"),
        "price_invalid" => ("Price must be a number", "يجب أن يكون السعر رقماً"),
        "price_too_low" => ("Price must be at least 1", "يجب أن يكون السعر 1 على الأقل"),
        "cost_invalid" => (
            "Delivery cost must be a number",
            "يجب أن تكون تكلفة التوصيل رقماً",
        ),
        "cost_negative" => (
            "Delivery cost cannot be negative",
            "لا يمكن أن تكون تكلفة التوصيل سالبة",
        ),
        "quantity_invalid" => (
            "Quantity must be a whole number between 1 and 10000",
            "يجب أن تكون الكمية عدداً صحيحاً بين 1 و 10000",
        ),
        "amount_too_high" => (
            "Amount cannot exceed 1,000,000,000",
            "لا يمكن أن يتجاوز المبلغ 1,000,000,000",
        ),
        "total_too_large" => ("Order total is too large", "إجمالي الطلب كبير جداً"),
        "type_mismatch" => ("Unexpected value type", "نوع القيمة غير صحيح"),
        "request_malformed" => ("The request could not be read", "تعذرت قراءة الطلب"),
        "type_invalid" => (
            "Product type must be simple or variant",
            "يجب أن يكون نوع المنتج بسيطاً أو متعدد الخيارات",
        ),
        "payment_method_required" => ("Payment method is required", "طريقة الدفع مطلوبة"),
        "payment_method_invalid" => ("Unknown payment method", "طريقة دفع غير معروفة"),
        "payment_status_invalid" => ("Unknown payment status", "حالة دفع غير معروفة"),
        "order_status_invalid" => ("Unknown order status", "حالة طلب غير معروفة"),
        "zone_invalid" => ("Unknown delivery zone", "منطقة توصيل غير معروفة"),
        "role_invalid" => ("Role must be owner or staff", "يجب أن يكون الدور مالكاً أو موظفاً"),
        "status_invalid" => (
            "Status must be active or disabled",
            "يجب أن تكون الحالة فعالة أو معطلة",
        ),
        "customer_required" => ("Please select a customer", "يرجى اختيار العميل"),
        "product_required" => ("Please select a product", "يرجى اختيار المنتج"),
        "items_required" => (
            "Add at least one product",
            "يرجى إضافة منتج واحد على الأقل",
        ),
        _ => ("Invalid value", "قيمة غير صالحة"),
    };
    match locale {
        Locale::En => en,
        Locale::Ar => ar,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn negotiates_first_known_language() {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("fr-FR, en-US;q=0.8, ar;q=0.5"));
        assert_eq!(Locale::negotiate(&headers, Locale::Ar), Locale::En);
        assert_eq!(Locale::negotiate(&HeaderMap::new(), Locale::Ar), Locale::Ar);
    }

    #[test]
    fn negotiation_honours_quality_weights() {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("ar;q=0.1, en;q=0.9"));
        assert_eq!(Locale::negotiate(&headers, Locale::Ar), Locale::En);

        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en;q=0, ar-PS"));
        assert_eq!(Locale::negotiate(&headers, Locale::En), Locale::Ar);

        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en;q=0"));
        assert_eq!(Locale::negotiate(&headers, Locale::Ar), Locale::Ar);
    }

    #[test]
    fn outcome_messages_in_both_languages() {
        let msg = Message::Created(EntityKind::DeliveryCompany);
        assert_eq!(msg.text(Locale::En), "Delivery company created successfully");
        assert_eq!(msg.text(Locale::Ar), "تم إنشاء شركة التوصيل بنجاح");
    }

    #[test]
    fn unknown_rule_codes_fall_back() {
        assert_eq!(rule_text("nope", Locale::En), "Invalid value");
    }
}
