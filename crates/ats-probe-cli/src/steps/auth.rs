use crate::world::AtsWorld;
use ats_probe::{LoginParams, ProbeResult};
use cucumber::{given, then};

#[given(regex = r#"^Login to system with "([^"]*)" and "([^"]*)" and "([^"]*)" and "([^"]*)" and "([^"]*)"$"#)]
async fn login_to_system(
    world: &mut AtsWorld,
    page_url: String,
    email: String,
    search_text: String,
    account_index: String,
    password: String,
) -> ProbeResult<()> {
    let params = LoginParams::new(page_url, email, search_text, account_index, password);
    world.ctx().login(&params).await
}

#[given(regex = r"^perform logout from system$")]
async fn perform_logout(world: &mut AtsWorld) -> ProbeResult<()> {
    world.ctx().logout().await
}

#[then(regex = r"^verify login successful$")]
async fn verify_login_successful(world: &mut AtsWorld) -> ProbeResult<()> {
    world.ctx().verify_login_successful().await
}
