pub mod unit_automation;
