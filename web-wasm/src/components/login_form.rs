//! ログイン・新規登録フォーム

use crate::app::{current_route, navigate_to, use_dashboard, use_revision};
use crate::components::field_error::FieldError;
use leptos::prelude::*;
use leptos::task::spawn_local;
use petcare_common::notify::report_outcome;
use petcare_common::{Credentials, FieldErrors, Registration};

#[component]
pub fn LoginForm() -> impl IntoView {
    let dashboard = use_dashboard();
    let revision = use_revision();

    let (registering, set_registering) = signal(false);
    let name = RwSignal::new(String::new());
    let email = RwSignal::new(String::new());
    let password = RwSignal::new(String::new());
    let password_confirmation = RwSignal::new(String::new());
    let errors = RwSignal::new(FieldErrors::new());

    let is_loading = {
        let dashboard = dashboard.clone();
        move || {
            revision.track();
            dashboard.auth.is_loading()
        }
    };

    let on_submit = {
        let dashboard = dashboard.clone();
        move |ev: leptos::ev::SubmitEvent| {
            ev.prevent_default();
            if dashboard.auth.is_loading() {
                return;
            }
            let dashboard = dashboard.clone();
            let register = registering.get_untracked();
            let (n, e, p, c) = (
                name.get_untracked(),
                email.get_untracked(),
                password.get_untracked(),
                password_confirmation.get_untracked(),
            );

            spawn_local(async move {
                let outcome = if register {
                    dashboard
                        .auth
                        .register(Registration {
                            name: n,
                            email: e,
                            password: p,
                            password_confirmation: c,
                        })
                        .await
                } else {
                    dashboard
                        .auth
                        .login(Credentials { email: e, password: p })
                        .await
                };

                let done = if register { "登録しました" } else { "ログインしました" };
                report_outcome(&dashboard.toasts, &outcome, done);
                if outcome.success {
                    navigate_to(&dashboard, current_route());
                } else {
                    errors.set(outcome.field_errors.unwrap_or_default());
                }
            });
        }
    };

    let toggle_mode = move |_| {
        set_registering.update(|r| *r = !*r);
        errors.set(FieldErrors::new());
        dashboard.auth.clear_error();
    };

    let is_loading_attr = is_loading.clone();

    view! {
        <div class="login-panel">
            <h1>"PetCare 管理画面"</h1>
            <form class="entity-form" on:submit=on_submit>
                <h3>{move || if registering.get() { "新規登録" } else { "ログイン" }}</h3>

                <Show when=move || registering.get()>
                    <div class="form-group">
                        <label for="auth-name">"名前"</label>
                        <input
                            id="auth-name"
                            prop:value=move || name.get()
                            on:input=move |ev| name.set(event_target_value(&ev))
                        />
                        <FieldError errors=errors field="name" />
                    </div>
                </Show>

                <div class="form-group">
                    <label for="auth-email">"メールアドレス"</label>
                    <input
                        type="email"
                        id="auth-email"
                        autocomplete="username"
                        prop:value=move || email.get()
                        on:input=move |ev| email.set(event_target_value(&ev))
                    />
                    <FieldError errors=errors field="email" />
                </div>

                <div class="form-group">
                    <label for="auth-password">"パスワード"</label>
                    <input
                        type="password"
                        id="auth-password"
                        autocomplete="current-password"
                        prop:value=move || password.get()
                        on:input=move |ev| password.set(event_target_value(&ev))
                    />
                    <FieldError errors=errors field="password" />
                </div>

                <Show when=move || registering.get()>
                    <div class="form-group">
                        <label for="auth-password-confirmation">"パスワード（確認）"</label>
                        <input
                            type="password"
                            id="auth-password-confirmation"
                            prop:value=move || password_confirmation.get()
                            on:input=move |ev| password_confirmation.set(event_target_value(&ev))
                        />
                        <FieldError errors=errors field="password_confirmation" />
                    </div>
                </Show>

                <div class="form-actions">
                    <button type="button" class="btn btn-tertiary" on:click=toggle_mode>
                        {move || if registering.get() { "ログインに戻る" } else { "新規登録" }}
                    </button>
                    <button type="submit" class="btn btn-primary" disabled=is_loading_attr>
                        {move || if is_loading() { "送信中..." } else if registering.get() { "登録" } else { "ログイン" }}
                    </button>
                </div>
            </form>
        </div>
    }
}
