// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Login and registration form.

use eframe::egui;

use crate::models::session::{AuthRequest, Credentials, Registration, validate_auth_request};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AuthMode {
    #[default]
    Login,
    Register,
}

/// Form state. The password never leaves this model except inside an `AuthRequest`.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct LoginModel {
    pub mode: AuthMode,
    pub username: String,
    pub email: String,
    password: String,
    errors: Vec<String>,
    busy: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoginMsg {
    ModeChanged(AuthMode),
    UsernameChanged(String),
    EmailChanged(String),
    PasswordChanged(String),
    Submit,
}

impl LoginModel {
    /// Fresh form with the username prefilled.
    pub fn for_user(username: String) -> Self {
        Self {
            username,
            ..Self::default()
        }
    }

    /// Messages from the last failed attempt.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Whether a request is in flight.
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn fail(&mut self, errors: Vec<String>) {
        self.busy = false;
        self.errors = errors;
    }

    /// Forget the password and any errors once a session exists.
    pub fn succeed(&mut self) {
        self.busy = false;
        self.errors.clear();
        self.password.clear();
        self.email.clear();
    }

    fn request(&self) -> AuthRequest {
        match self.mode {
            AuthMode::Login => AuthRequest::Login(Credentials {
                username: self.username.trim().to_string(),
                password: self.password.clone(),
            }),
            AuthMode::Register => AuthRequest::Register(Registration {
                username: self.username.trim().to_string(),
                email: self.email.trim().to_string(),
                password: self.password.clone(),
            }),
        }
    }
}

/// Apply a message. Returns the request to send when the form was submitted and is valid.
pub fn update(model: &mut LoginModel, msg: LoginMsg) -> Option<AuthRequest> {
    match msg {
        LoginMsg::ModeChanged(mode) => {
            model.mode = mode;
            model.errors.clear();
        }
        LoginMsg::UsernameChanged(text) => model.username = text,
        LoginMsg::EmailChanged(text) => model.email = text,
        LoginMsg::PasswordChanged(text) => model.password = text,
        LoginMsg::Submit => {
            if model.busy {
                return None;
            }
            let request = model.request();
            let errors = validate_auth_request(&request);
            if !errors.is_empty() {
                model.errors = errors;
                return None;
            }
            model.errors.clear();
            model.busy = true;
            return Some(request);
        }
    }
    None
}

/// Render the form and return any messages triggered by user interaction.
pub fn view(ui: &mut egui::Ui, model: &LoginModel) -> Vec<LoginMsg> {
    let mut msgs = Vec::new();

    ui.horizontal(|ui| {
        for (mode, label) in [(AuthMode::Login, "Log in"), (AuthMode::Register, "Register")] {
            if ui
                .add(egui::Button::new(label).selected(model.mode == mode))
                .clicked()
                && model.mode != mode
            {
                msgs.push(LoginMsg::ModeChanged(mode));
            }
        }
    });
    ui.add_space(8.0);

    egui::Grid::new("login_grid")
        .num_columns(2)
        .spacing(egui::vec2(8.0, 8.0))
        .show(ui, |ui| {
            ui.label("Username");
            let mut username = model.username.clone();
            if ui.text_edit_singleline(&mut username).changed() {
                msgs.push(LoginMsg::UsernameChanged(username));
            }
            ui.end_row();

            if model.mode == AuthMode::Register {
                ui.label("Email");
                let mut email = model.email.clone();
                if ui.text_edit_singleline(&mut email).changed() {
                    msgs.push(LoginMsg::EmailChanged(email));
                }
                ui.end_row();
            }

            ui.label("Password");
            let mut password = model.password.clone();
            let response = ui.add(egui::TextEdit::singleline(&mut password).password(true));
            if response.changed() {
                msgs.push(LoginMsg::PasswordChanged(password));
            }
            if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                msgs.push(LoginMsg::Submit);
            }
            ui.end_row();
        });

    ui.add_space(8.0);
    ui.horizontal(|ui| {
        let label = match model.mode {
            AuthMode::Login => format!("{} Log in", egui_phosphor::regular::SIGN_IN),
            AuthMode::Register => format!("{} Create account", egui_phosphor::regular::USER_PLUS),
        };
        if ui.add_enabled(!model.busy, egui::Button::new(label)).clicked() {
            msgs.push(LoginMsg::Submit);
        }
        if model.busy {
            ui.add(egui::Spinner::new().size(14.0));
        }
    });

    for error in &model.errors {
        ui.colored_label(egui::Color32::from_rgb(220, 53, 69), error);
    }

    msgs
}
