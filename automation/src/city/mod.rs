pub mod construction_automation;
