//! # Contact 模块
//!
//! 联系表单校验与提交。
//!
//! 提交流程：校验 → 构造 [`Submission`] → 交给 [`FormBackend`]。
//! 任一环节失败都只产生一条错误提示，表单保留用户输入；成功后表单清空。

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::ContactSettings;
use crate::error::{FormError, FormField, SubmitError};
use crate::notification::NotificationCenter;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("邮箱正则是合法的字面量")
});

/// 提交成功后的提示
pub const SUCCESS_MESSAGE: &str = "Thank you for your message! We'll get back to you soon.";

/// 后端拒绝时的提示
pub const FAILURE_MESSAGE: &str = "Sorry, something went wrong. Please try again later.";

/// 联系表单输入
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    /// 感兴趣的服务
    #[serde(default)]
    pub interest: String,
    #[serde(default)]
    pub message: String,
    /// 是否同意隐私条款
    #[serde(default)]
    pub consent: bool,
}

impl ContactForm {
    /// 校验必填字段与邮箱格式
    pub fn validate(&self) -> Result<(), FormError> {
        let required = [
            (FormField::Name, &self.name),
            (FormField::Email, &self.email),
            (FormField::Message, &self.message),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(FormError::MissingField { field });
            }
        }

        let email = self.email.trim();
        if !EMAIL_PATTERN.is_match(email) {
            return Err(FormError::InvalidEmail {
                email: email.to_string(),
            });
        }

        if !self.consent {
            return Err(FormError::ConsentRequired);
        }

        Ok(())
    }

    /// 清空所有输入
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 发往表单后端的数据（字段名固定）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Submission {
    pub access_key: String,
    pub subject: String,
    pub from_name: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub interest: String,
    pub message: String,
}

impl Submission {
    /// 由已校验的表单构造
    pub fn from_form(form: &ContactForm, settings: &ContactSettings) -> Self {
        Self {
            access_key: settings.access_key.clone(),
            subject: settings.subject.clone(),
            from_name: settings.from_name.clone(),
            name: form.name.trim().to_string(),
            email: form.email.trim().to_string(),
            phone: form.phone.trim().to_string(),
            interest: form.interest.trim().to_string(),
            message: form.message.trim().to_string(),
        }
    }
}

/// 表单后端
pub trait FormBackend {
    fn submit(&mut self, submission: &Submission) -> Result<(), SubmitError>;
}

/// 校验并提交联系表单
///
/// 成功时显示成功提示并清空表单；失败时显示一条错误提示，表单保持不变。
pub fn submit_contact_form<B: FormBackend + ?Sized>(
    form: &mut ContactForm,
    settings: &ContactSettings,
    backend: &mut B,
    notifications: &mut NotificationCenter,
) -> Result<(), SubmitError> {
    if let Err(e) = form.validate() {
        debug!(error = %e, "表单校验失败");
        notifications.error(e.user_message());
        return Err(e.into());
    }

    let submission = Submission::from_form(form, settings);
    match backend.submit(&submission) {
        Ok(()) => {
            info!(email = %submission.email, "联系表单已提交");
            notifications.success(SUCCESS_MESSAGE);
            form.reset();
            Ok(())
        }
        Err(e) => {
            warn!(error = %e, "联系表单提交失败");
            notifications.error(FAILURE_MESSAGE);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::Severity;

    #[derive(Default)]
    struct RecordingBackend {
        received: Vec<Submission>,
        reject: bool,
    }

    impl FormBackend for RecordingBackend {
        fn submit(&mut self, submission: &Submission) -> Result<(), SubmitError> {
            if self.reject {
                return Err(SubmitError::Rejected {
                    message: "quota exceeded".to_string(),
                });
            }
            self.received.push(submission.clone());
            Ok(())
        }
    }

    fn valid_form() -> ContactForm {
        ContactForm {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            phone: "+44 20 7946 0000".to_string(),
            interest: "investment".to_string(),
            message: "Tell me about HMOs".to_string(),
            consent: true,
        }
    }

    #[test]
    fn test_validate() {
        assert!(valid_form().validate().is_ok());

        let mut form = valid_form();
        form.name = "   ".to_string();
        assert_eq!(
            form.validate(),
            Err(FormError::MissingField {
                field: FormField::Name
            })
        );

        let mut form = valid_form();
        form.email = "ada@example".to_string();
        assert!(matches!(form.validate(), Err(FormError::InvalidEmail { .. })));

        let mut form = valid_form();
        form.email = "a da@example.com".to_string();
        assert!(matches!(form.validate(), Err(FormError::InvalidEmail { .. })));

        let mut form = valid_form();
        form.consent = false;
        assert_eq!(form.validate(), Err(FormError::ConsentRequired));
    }

    #[test]
    fn test_missing_email_never_submits() {
        let mut form = valid_form();
        form.email.clear();
        let mut backend = RecordingBackend::default();
        let mut notifications = NotificationCenter::default();

        let result = submit_contact_form(
            &mut form,
            &ContactSettings::default(),
            &mut backend,
            &mut notifications,
        );

        assert!(matches!(result, Err(SubmitError::Invalid(_))));
        assert!(backend.received.is_empty());
        assert_eq!(notifications.active().len(), 1);
        assert_eq!(notifications.active()[0].severity, Severity::Error);
        // 保留用户输入
        assert_eq!(form.name, "Ada");
    }

    #[test]
    fn test_successful_submission_resets_form() {
        let mut form = valid_form();
        let mut backend = RecordingBackend::default();
        let mut notifications = NotificationCenter::default();
        let settings = ContactSettings {
            access_key: "key-123".to_string(),
            ..ContactSettings::default()
        };

        submit_contact_form(&mut form, &settings, &mut backend, &mut notifications).unwrap();

        assert_eq!(backend.received.len(), 1);
        assert_eq!(backend.received[0].access_key, "key-123");
        assert_eq!(backend.received[0].interest, "investment");
        assert_eq!(form, ContactForm::default());
        assert_eq!(notifications.active()[0].message, SUCCESS_MESSAGE);
    }

    #[test]
    fn test_rejected_submission_keeps_form() {
        let mut form = valid_form();
        let mut backend = RecordingBackend {
            reject: true,
            ..Default::default()
        };
        let mut notifications = NotificationCenter::default();

        let result = submit_contact_form(
            &mut form,
            &ContactSettings::default(),
            &mut backend,
            &mut notifications,
        );

        assert!(matches!(result, Err(SubmitError::Rejected { .. })));
        assert_eq!(form, valid_form());
        assert_eq!(notifications.active().len(), 1);
    }

    #[test]
    fn test_submission_field_names() {
        let submission = Submission::from_form(&valid_form(), &ContactSettings::default());
        let json = serde_json::to_value(&submission).unwrap();
        let mut keys: Vec<&str> = json
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        keys.sort();
        assert_eq!(
            keys,
            vec![
                "access_key",
                "email",
                "from_name",
                "interest",
                "message",
                "name",
                "phone",
                "subject"
            ]
        );
    }
}
