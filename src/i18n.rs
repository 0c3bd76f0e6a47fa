//! Message catalogue for operator-facing texts
//!
//! A [`Translator`] is handed to the orchestrator and to every notifier at
//! construction time. Log lines stay in English.

use serde::{Deserialize, Serialize};

/// Supported display languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum Language {
    #[default]
    En,
    Fa,
}

impl Language {
    /// Parse a language code, falling back to English for anything unknown
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_lowercase().as_str() {
            "fa" | "fa_ir" | "persian" | "farsi" => Language::Fa,
            "en" | "en_us" | "en_gb" | "english" => Language::En,
            other => {
                tracing::warn!("Unknown language '{}', falling back to English", other);
                Language::En
            }
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Fa => "fa",
        }
    }
}

impl From<String> for Language {
    fn from(value: String) -> Self {
        Language::from_code(&value)
    }
}

impl From<Language> for String {
    fn from(value: Language) -> Self {
        value.code().to_string()
    }
}

/// Keys of every translated text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKey {
    BackupCompleted,
    BackupFailed,
    DatabaseBackupFailed,
    UnexpectedError,
    DirectoryBusy,
    DatabaseDetails,
    DatabaseType,
    DatabaseHost,
    DatabaseName,
    BackupDetails,
    BackupFile,
    BackupPath,
    BackupSize,
    BackupDuration,
    BackupTimestamp,
    ErrorLabel,
    ErrorDetails,
    EmailSuccessSubject,
    EmailFailureSubject,
    EmailFailureHint,
    EmailAttachmentSkipped,
    DocumentCaption,
    StarMessage,
}

/// Looks up texts in the configured language
#[derive(Debug, Clone, Copy, Default)]
pub struct Translator {
    language: Language,
}

impl Translator {
    pub fn new(language: Language) -> Self {
        Self { language }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn text(&self, key: MessageKey) -> &'static str {
        match self.language {
            Language::En => english(key),
            Language::Fa => persian(key),
        }
    }
}

fn english(key: MessageKey) -> &'static str {
    use MessageKey::*;
    match key {
        BackupCompleted => "Database backup completed successfully!",
        BackupFailed => "Database backup failed!",
        DatabaseBackupFailed => "Database backup failed",
        UnexpectedError => "Unexpected error during backup",
        DirectoryBusy => "Another backup run is using the backup directory",
        DatabaseDetails => "Database Details",
        DatabaseType => "Type",
        DatabaseHost => "Host",
        DatabaseName => "Database",
        BackupDetails => "Backup Details",
        BackupFile => "File",
        BackupPath => "Path",
        BackupSize => "Size",
        BackupDuration => "Duration",
        BackupTimestamp => "Timestamp",
        ErrorLabel => "Error",
        ErrorDetails => "Error Details",
        EmailSuccessSubject => "Database Backup Completed Successfully",
        EmailFailureSubject => "Database Backup Failed",
        EmailFailureHint => "Please check the backup system and resolve the issue.",
        EmailAttachmentSkipped => "Note: Backup file is too large to attach via email.",
        DocumentCaption => "Backup file",
        StarMessage => "\u{2b50} If this backup tool is helpful, please consider starring the project.\n\u{1f4a1} You can disable this message by setting SHOW_STAR_MESSAGE=false in your .env file",
    }
}

fn persian(key: MessageKey) -> &'static str {
    use MessageKey::*;
    match key {
        BackupCompleted => "پشتیبان‌گیری از پایگاه داده با موفقیت تکمیل شد!",
        BackupFailed => "پشتیبان‌گیری از پایگاه داده ناموفق بود!",
        DatabaseBackupFailed => "پشتیبان‌گیری از پایگاه داده ناموفق بود",
        UnexpectedError => "خطای غیرمنتظره در حین پشتیبان‌گیری",
        DirectoryBusy => "اجرای دیگری از پشتیبان‌گیری در حال استفاده از پوشه پشتیبان است",
        DatabaseDetails => "جزئیات پایگاه داده",
        DatabaseType => "نوع",
        DatabaseHost => "میزبان",
        DatabaseName => "پایگاه داده",
        BackupDetails => "جزئیات پشتیبان",
        BackupFile => "فایل",
        BackupPath => "مسیر",
        BackupSize => "اندازه",
        BackupDuration => "مدت زمان",
        BackupTimestamp => "زمان",
        ErrorLabel => "خطا",
        ErrorDetails => "جزئیات خطا",
        EmailSuccessSubject => "پشتیبان‌گیری از پایگاه داده با موفقیت انجام شد",
        EmailFailureSubject => "پشتیبان‌گیری از پایگاه داده ناموفق بود",
        EmailFailureHint => "لطفاً سیستم پشتیبان‌گیری را بررسی و مشکل را برطرف کنید.",
        EmailAttachmentSkipped => "توجه: فایل پشتیبان برای ارسال از طریق ایمیل بیش از حد بزرگ است.",
        DocumentCaption => "فایل پشتیبان",
        StarMessage => "\u{2b50} اگر این ابزار پشتیبان‌گیری مفید است، لطفاً به پروژه ستاره دهید.\n\u{1f4a1} می‌توانید این پیام را با تنظیم SHOW_STAR_MESSAGE=false در فایل .env خود غیرفعال کنید",
    }
}
