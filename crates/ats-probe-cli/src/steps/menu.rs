use crate::world::AtsWorld;
use ats_probe::ProbeResult;
use cucumber::given;

#[given(regex = r#"^Select menu "([^"]*)" and sub-menu "([^"]*)"$"#)]
async fn select_menu_and_sub_menu(world: &mut AtsWorld, menu: String, sub_menu_index: String) -> ProbeResult<()> {
    world.ctx().select_menu_and_sub_menu(&menu, &sub_menu_index).await
}

#[given(regex = r"^verify page opened successfully$")]
async fn verify_page_opened(world: &mut AtsWorld) -> ProbeResult<()> {
    world.ctx().verify_page_opened().await
}
