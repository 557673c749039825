//! The CRUD suite: login, create, edit, delete, PDF export, logout.
//!
//! Scenarios share application state: create leaves the record that edit
//! modifies and delete removes, and everything after login relies on the
//! session cookie. [`CrudScenario::ALL`] is the order they must run in.

use async_trait::async_trait;

use crate::driver::BrowserSession;
use crate::error::ScenarioResult;
use crate::scenario::{Scenario, ScenarioContext};

/// Form values for a character record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Character {
    pub name: &'static str,
    pub color: &'static str,
    pub kind: &'static str,
    pub level: &'static str,
    pub photo: &'static str,
}

pub const WALTER_WHITE: Character = Character {
    name: "Walter White",
    color: "#FFFFFF",
    kind: "Protagonista",
    level: "10",
    photo: "https://upload.wikimedia.org/wikipedia/en/0/03/Walter_White_S5B.png",
};

pub const EDITED_NAME: &str = "Walter White Modificado";
pub const EDITED_LEVEL: &str = "9";

pub const LOGIN_PAGE: &str = "/login.php";
pub const INDEX_PAGE: &str = "/index.php";

/// Element locators for the application's pages
pub mod locators {
    use crate::driver::{xpath_literal, Locator};

    pub const EDIT_BUTTON_CLASS: &str = "btn-warning";
    pub const DELETE_BUTTON_CLASS: &str = "btn-danger";
    pub const PDF_BUTTON_CLASS: &str = "btn-primary";

    pub fn username() -> Locator {
        Locator::name("username")
    }

    pub fn password() -> Locator {
        Locator::name("password")
    }

    pub fn submit() -> Locator {
        Locator::css("button[type='submit']")
    }

    pub fn add_link() -> Locator {
        Locator::link_text("Agregar Personaje")
    }

    pub fn field(name: &str) -> Locator {
        Locator::name(name)
    }

    /// `<h2>` whose text contains `text`
    pub fn heading(text: &str) -> Locator {
        Locator::xpath(format!("//h2[contains(text(),{})]", xpath_literal(text)))
    }

    /// Table cell whose text contains `text`
    pub fn cell(text: &str) -> Locator {
        Locator::xpath(format!("//td[contains(text(),{})]", xpath_literal(text)))
    }

    pub fn rows() -> Locator {
        Locator::xpath("//tbody/tr")
    }

    /// Action link with the given button class in the first listed record
    pub fn first_row_action(class: &str) -> Locator {
        Locator::xpath(format!(
            "//tr[1]//a[contains(@class,{})]",
            xpath_literal(class)
        ))
    }

    pub fn logout_link() -> Locator {
        Locator::xpath(
            "//a[contains(@href, 'logout') or contains(text(),'Cerrar sesión') or contains(text(),'Logout')]",
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrudScenario {
    Login,
    CreateCharacter,
    EditCharacter,
    DeleteCharacter,
    GeneratePdf,
    Logout,
}

impl CrudScenario {
    pub const ALL: [CrudScenario; 6] = [
        CrudScenario::Login,
        CrudScenario::CreateCharacter,
        CrudScenario::EditCharacter,
        CrudScenario::DeleteCharacter,
        CrudScenario::GeneratePdf,
        CrudScenario::Logout,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            CrudScenario::Login => "test_1_login",
            CrudScenario::CreateCharacter => "test_2_crear_personaje",
            CrudScenario::EditCharacter => "test_3_editar_personaje",
            CrudScenario::DeleteCharacter => "test_4_eliminar_personaje",
            CrudScenario::GeneratePdf => "test_5_generar_pdf",
            CrudScenario::Logout => "test_6_logout",
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            CrudScenario::Login => "Test de inicio de sesión exitoso",
            CrudScenario::CreateCharacter => "Test de creación de nuevo personaje",
            CrudScenario::EditCharacter => "Test de edición de personaje existente",
            CrudScenario::DeleteCharacter => "Test de eliminación de personaje",
            CrudScenario::GeneratePdf => "Test de generación de PDF de personaje",
            CrudScenario::Logout => "Test de cierre de sesión",
        }
    }

    /// The suite in run order, keeping only scenarios whose name contains
    /// `filter` (all of them when `None`)
    pub fn selected(filter: Option<&str>) -> Vec<CrudScenario> {
        Self::ALL
            .into_iter()
            .filter(|s| filter.map_or(true, |f| CrudScenario::name(*s).contains(f)))
            .collect()
    }
}

#[async_trait]
impl<S: BrowserSession> Scenario<S> for CrudScenario {
    fn name(&self) -> &str {
        CrudScenario::name(*self)
    }

    fn description(&self) -> &str {
        CrudScenario::description(*self)
    }

    async fn run(&self, ctx: &mut ScenarioContext<'_, S>) -> ScenarioResult<()> {
        match self {
            CrudScenario::Login => login(ctx).await,
            CrudScenario::CreateCharacter => create_character(ctx).await,
            CrudScenario::EditCharacter => edit_character(ctx).await,
            CrudScenario::DeleteCharacter => delete_character(ctx).await,
            CrudScenario::GeneratePdf => generate_pdf(ctx).await,
            CrudScenario::Logout => logout(ctx).await,
        }
    }
}

async fn login<S: BrowserSession>(ctx: &mut ScenarioContext<'_, S>) -> ScenarioResult<()> {
    let credentials = &ctx.config().credentials;

    ctx.navigate(LOGIN_PAGE).await?;
    ctx.checkpoint("pantalla_login").await;

    ctx.type_into(&locators::username(), &credentials.username).await?;
    ctx.type_into(&locators::password(), &credentials.password).await?;
    ctx.checkpoint("login_datos_ingresados").await;

    ctx.click(&locators::submit()).await?;
    ctx.wait_present(&locators::heading("Personajes")).await?;
    ctx.checkpoint("login_exitoso").await;

    let url = ctx.current_url().await?;
    ctx.assert_contains(&url, "index.php")
}

async fn create_character<S: BrowserSession>(
    ctx: &mut ScenarioContext<'_, S>,
) -> ScenarioResult<()> {
    let character = WALTER_WHITE;

    ctx.navigate(INDEX_PAGE).await?;
    ctx.click(&locators::add_link()).await?;
    ctx.checkpoint("crear_personaje_antes").await;

    ctx.wait_present(&locators::heading("Agregar")).await?;

    ctx.type_into(&locators::field("nombre"), character.name).await?;
    ctx.type_into(&locators::field("color"), character.color).await?;
    ctx.type_into(&locators::field("tipo"), character.kind).await?;
    ctx.type_into(&locators::field("nivel"), character.level).await?;
    ctx.type_into(&locators::field("foto"), character.photo).await?;
    ctx.checkpoint("crear_formulario_llenado").await;

    ctx.click(&locators::submit()).await?;
    ctx.wait_present(&locators::cell(character.name)).await?;
    ctx.checkpoint("crear_personaje_exitoso").await;
    Ok(())
}

async fn edit_character<S: BrowserSession>(
    ctx: &mut ScenarioContext<'_, S>,
) -> ScenarioResult<()> {
    ctx.navigate(INDEX_PAGE).await?;
    let edit = ctx
        .wait_clickable(&locators::first_row_action(locators::EDIT_BUTTON_CLASS))
        .await?;
    ctx.click_element(&edit, "edit button").await?;

    ctx.wait_present(&locators::heading("Editar")).await?;
    ctx.checkpoint("editar_formulario_vacio").await;

    let name = locators::field("nombre");
    let level = locators::field("nivel");
    ctx.clear(&name).await?;
    ctx.clear(&level).await?;
    ctx.checkpoint("editar_formulario_limpio").await;

    ctx.type_into(&name, EDITED_NAME).await?;
    ctx.type_into(&level, EDITED_LEVEL).await?;
    ctx.checkpoint("editar_formulario_llenado").await;

    ctx.click(&locators::submit()).await?;
    ctx.wait_present(&locators::cell(EDITED_NAME)).await?;
    ctx.checkpoint("edicion_exitosa").await;

    let url = ctx.current_url().await?;
    ctx.assert_contains(&url, "index.php")
}

async fn delete_character<S: BrowserSession>(
    ctx: &mut ScenarioContext<'_, S>,
) -> ScenarioResult<()> {
    ctx.navigate(INDEX_PAGE).await?;
    let before = ctx.count(&locators::rows()).await?;

    let delete = ctx
        .wait_clickable(&locators::first_row_action(locators::DELETE_BUTTON_CLASS))
        .await?;
    ctx.checkpoint("eliminar_confirmacion").await;
    ctx.click_element(&delete, "delete button").await?;

    let dialog_timeout = ctx.config().timeouts.dialog();
    ctx.accept_optional_dialog(dialog_timeout).await?;

    ctx.wait_invisible(&locators::cell(EDITED_NAME)).await?;
    ctx.checkpoint("eliminado_despues").await;

    let after = ctx.count(&locators::rows()).await?;
    ctx.ensure(
        after + 1 == before,
        format!(
            "expected {} row(s) after delete, found {} (was {})",
            before.saturating_sub(1),
            after,
            before
        ),
    )
}

async fn generate_pdf<S: BrowserSession>(ctx: &mut ScenarioContext<'_, S>) -> ScenarioResult<()> {
    ctx.navigate(INDEX_PAGE).await?;
    let pdf = ctx
        .wait_clickable(&locators::first_row_action(locators::PDF_BUTTON_CLASS))
        .await?;
    ctx.click_element(&pdf, "PDF button").await?;
    ctx.checkpoint("despues_de_generalpdf").await;
    Ok(())
}

async fn logout<S: BrowserSession>(ctx: &mut ScenarioContext<'_, S>) -> ScenarioResult<()> {
    ctx.navigate(INDEX_PAGE).await?;
    let logout = ctx.wait_clickable(&locators::logout_link()).await?;
    ctx.checkpoint("antes_logout").await;
    ctx.click_element(&logout, "logout link").await?;

    ctx.wait_present(&locators::username()).await?;
    ctx.checkpoint("despues_logout").await;
    Ok(())
}
