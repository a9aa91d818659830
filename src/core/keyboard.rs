use crate::domain::model::{InlineButton, InlineKeyboard};

pub const CALLBACK_REGISTRATION: &str = "registration";
pub const CALLBACK_INFO: &str = "info";
pub const CALLBACK_CANCELLATION: &str = "cancellation";

fn button(text: &str, callback_data: &str) -> InlineButton {
    InlineButton {
        text: text.to_string(),
        callback_data: callback_data.to_string(),
    }
}

fn registration_button() -> InlineButton {
    button("✔️ Регистрация", CALLBACK_REGISTRATION)
}

fn info_button() -> InlineButton {
    button("ℹ️ Info", CALLBACK_INFO)
}

/// 註冊與說明各占一列
pub fn auth_keyboard() -> InlineKeyboard {
    InlineKeyboard {
        inline_keyboard: vec![vec![registration_button()], vec![info_button()]],
    }
}

pub fn auth_begin_keyboard() -> InlineKeyboard {
    InlineKeyboard {
        inline_keyboard: vec![vec![registration_button()]],
    }
}

pub fn info_keyboard() -> InlineKeyboard {
    InlineKeyboard {
        inline_keyboard: vec![vec![info_button()]],
    }
}

pub fn cancellation_keyboard() -> InlineKeyboard {
    InlineKeyboard {
        inline_keyboard: vec![vec![button("Отмена", CALLBACK_CANCELLATION)]],
    }
}
