use crate::world::AtsWorld;
use ats_probe::ProbeResult;
use cucumber::given;

#[given(regex = r#"^find parameter name at index "([^"]*)"$"#)]
async fn find_parameter_name(world: &mut AtsWorld, index: String) -> ProbeResult<()> {
    world.ctx().find_parameter_at_index(&index).await
}

#[given(regex = r#"^find record number at index "([^"]*)"$"#)]
async fn find_record_number(world: &mut AtsWorld, index: String) -> ProbeResult<()> {
    world.ctx().find_record_at_index(&index).await
}

#[given(regex = r#"^find option id with text "([^"]*)"$"#)]
async fn find_option_id(world: &mut AtsWorld, text: String) -> ProbeResult<()> {
    world.ctx().find_option_with_text(&text).await
}
