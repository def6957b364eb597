//! 交互菜单
//!
//! 四级页面：主菜单 -> 设备 / Thingstream / NTRIP 批量配置页 + 原始 API 页。
//! 输入格式 `<option>, <value>, ...`，`b` 返回上级，`q` 退出。
//! 断开期间菜单保持可用（提示链路状态，发送路径快速失败）；
//! 无效输入就地提示预期格式后继续。

use crate::actions::Actions;
use anyhow::Result;
use hpgat_session::SerialSession;
use rustyline::Editor;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;

/// 菜单页面
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Page {
    Main,
    Device,
    Thingstream,
    Ntrip,
    Api,
}

/// 运行菜单主循环，返回即退出进程
pub fn run(actions: &Actions, session: &SerialSession) -> Result<()> {
    let mut rl: Editor<(), DefaultHistory> = Editor::new()?;
    let mut page = Page::Main;

    print_title();

    loop {
        // 断开只提示，不锁死输入：发送路径自己会快速失败，
        // 监督线程在后台重连，q / Ctrl-C 随时可用
        if !session.is_connected() {
            println!("serial link down, reconnecting in background (q quits)...");
        }

        print_page(page);
        let line = match rl.readline("\nEnter option to continue...\n> ") {
            Ok(line) => {
                let _ = rl.add_history_entry(line.as_str());
                line
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        let choice = line.trim();

        match choice {
            "q" => return Ok(()),
            "b" if page != Page::Main => {
                page = Page::Main;
                continue;
            }
            _ => {}
        }

        match page {
            Page::Main => page = main_page(choice),
            Page::Device => device_page(choice, actions),
            Page::Thingstream => thingstream_page(choice, actions),
            Page::Ntrip => ntrip_page(choice, actions),
            Page::Api => api_page(choice, actions),
        }
    }
}

fn print_title() {
    println!("\t**********************************************");
    println!("\t***            HPG AT Interface            ***");
    println!("\t**********************************************");
}

/// 拆分 `<option>, <value>, ...`，返回 (选项号, 参数)
fn split_choice(input: &str) -> (Option<u32>, Vec<&str>) {
    let mut fields = input.split(", ").map(str::trim);
    let number = fields.next().and_then(|f| f.parse().ok());
    (number, fields.collect())
}

fn invalid_choice() {
    println!("Not a valid choice, format should be: <option>, <value> ...");
}

fn usage(format: &str) {
    println!("Command should be of format: {format}");
}

fn main_page(choice: &str) -> Page {
    match choice {
        "1" => Page::Device,
        "2" => Page::Thingstream,
        "3" => Page::Ntrip,
        "4" => Page::Api,
        _ => {
            invalid_choice();
            Page::Main
        }
    }
}

fn device_page(choice: &str, a: &Actions) {
    let (number, _) = split_choice(choice);
    let api = a.api();
    match number {
        Some(1) => a.device_apply_all(),
        Some(2) => a.device_read_all(),
        Some(3) => a.device_apply_interface(),
        Some(4) => a.dispatch(api.misc_interface_get()),
        Some(5) => a.device_apply_wifi(),
        Some(6) => a.dispatch(api.wifi_get()),
        Some(7) => a.device_apply_apn(),
        Some(8) => a.dispatch(api.apn_get()),
        Some(9) => a.device_apply_correction_source(),
        Some(10) => a.dispatch(api.misc_correction_source_get()),
        Some(11) => a.device_apply_correction_module(),
        Some(12) => a.dispatch(api.misc_correction_module_get()),
        Some(13) => a.device_apply_dead_reckoning(),
        Some(14) => a.dispatch(api.misc_dead_reckoning_get()),
        Some(15) => a.device_apply_sd_log(),
        Some(16) => a.dispatch(api.misc_sd_log_get()),
        _ => invalid_choice(),
    }
}

fn thingstream_page(choice: &str, a: &Actions) {
    let (number, _) = split_choice(choice);
    let api = a.api();
    match number {
        Some(1) => a.ts_apply_all(),
        Some(2) => a.ts_read_all(),
        Some(3) => a.ts_apply_broker(),
        Some(4) => a.dispatch(api.thingstream_broker_get()),
        Some(5) => a.ts_apply_client_id(),
        Some(6) => a.dispatch(api.thingstream_client_id_get()),
        Some(7) => a.ts_apply_key(),
        Some(8) => a.dispatch(api.thingstream_key_get()),
        Some(9) => a.ts_apply_certificate(),
        Some(10) => a.dispatch(api.thingstream_certificate_get()),
        Some(11) => a.ts_apply_root_ca(),
        Some(12) => a.dispatch(api.thingstream_root_ca_get()),
        Some(13) => a.ts_apply_plan(),
        Some(14) => a.dispatch(api.thingstream_plan_get()),
        Some(15) => a.ts_apply_region(),
        Some(16) => a.dispatch(api.thingstream_region_get()),
        _ => invalid_choice(),
    }
}

fn ntrip_page(choice: &str, a: &Actions) {
    let (number, _) = split_choice(choice);
    let api = a.api();
    match number {
        Some(1) => a.ntrip_apply_all(),
        Some(2) => a.ntrip_read_all(),
        Some(3) => a.ntrip_apply_server(),
        Some(4) => a.dispatch(api.ntrip_server_get()),
        Some(5) => a.ntrip_apply_user_agent(),
        Some(6) => a.dispatch(api.ntrip_user_agent_get()),
        Some(7) => a.ntrip_apply_mount_point(),
        Some(8) => a.dispatch(api.ntrip_mount_point_get()),
        Some(9) => a.ntrip_apply_credentials(),
        Some(10) => a.dispatch(api.ntrip_credentials_get()),
        Some(11) => a.ntrip_apply_gga_relay(),
        Some(12) => a.dispatch(api.ntrip_gga_relay_get()),
        _ => invalid_choice(),
    }
}

fn api_page(choice: &str, a: &Actions) {
    let (number, args) = split_choice(choice);
    let api = a.api();
    let args = args.as_slice();
    match number {
        // Wi-Fi
        Some(1) => match args {
            [ssid, password] => a.dispatch(api.wifi_set(ssid, password)),
            _ => usage("<option>, <ssid>, <password>"),
        },
        Some(2) => a.dispatch(api.wifi_get()),
        Some(3) => a.dispatch(api.wifi_delete()),
        // APN
        Some(4) => match args {
            [apn] => a.dispatch(api.apn_set(apn)),
            _ => usage("<option>, <apn>"),
        },
        Some(5) => a.dispatch(api.apn_get()),
        Some(6) => a.dispatch(api.apn_delete()),
        // Thingstream
        Some(7) => match args {
            [broker, port] => a.dispatch(api.thingstream_broker_set(broker, port)),
            _ => usage("<option>, <broker>, <port>"),
        },
        Some(8) => a.dispatch(api.thingstream_broker_get()),
        Some(9) => a.dispatch(api.thingstream_broker_delete()),
        Some(10) => match args {
            [client_id] => a.dispatch(api.thingstream_client_id_set(client_id)),
            _ => usage("<option>, <client id>"),
        },
        Some(11) => a.dispatch(api.thingstream_client_id_get()),
        Some(12) => a.dispatch(api.thingstream_client_id_delete()),
        Some(13) => match args {
            [cert] => a.dispatch(api.thingstream_certificate_set(cert)),
            _ => usage("<option>, <cert>"),
        },
        Some(14) => a.dispatch(api.thingstream_certificate_get()),
        Some(15) => a.dispatch(api.thingstream_certificate_delete()),
        Some(16) => match args {
            [key] => a.dispatch(api.thingstream_key_set(key)),
            _ => usage("<option>, <key>"),
        },
        Some(17) => a.dispatch(api.thingstream_key_get()),
        Some(18) => a.dispatch(api.thingstream_key_delete()),
        Some(19) => match args {
            [plan] => a.dispatch(api.thingstream_plan_set(plan)),
            _ => usage("<option>, <plan>"),
        },
        Some(20) => a.dispatch(api.thingstream_plan_get()),
        Some(21) => a.dispatch(api.thingstream_plan_delete()),
        Some(22) => match args {
            [region] => a.dispatch(api.thingstream_region_set(region)),
            _ => usage("<option>, <region>"),
        },
        Some(23) => a.dispatch(api.thingstream_region_get()),
        Some(24) => a.dispatch(api.thingstream_region_delete()),
        Some(25) => match args {
            [root_ca] => a.dispatch(api.thingstream_root_ca_set(root_ca)),
            _ => usage("<option>, <root_ca>"),
        },
        Some(26) => a.dispatch(api.thingstream_root_ca_get()),
        Some(27) => a.dispatch(api.thingstream_root_ca_delete()),
        // NTRIP
        Some(28) => match args {
            [server, port] => a.dispatch(api.ntrip_server_set(server, port)),
            _ => usage("<option>, <server>, <port>"),
        },
        Some(29) => a.dispatch(api.ntrip_server_get()),
        Some(30) => a.dispatch(api.ntrip_server_delete()),
        Some(31) => match args {
            [user_agent] => a.dispatch(api.ntrip_user_agent_set(user_agent)),
            _ => usage("<option>, <user_agent>"),
        },
        Some(32) => a.dispatch(api.ntrip_user_agent_get()),
        Some(33) => a.dispatch(api.ntrip_user_agent_delete()),
        Some(34) => match args {
            [mount_point] => a.dispatch(api.ntrip_mount_point_set(mount_point)),
            _ => usage("<option>, <mount_point>"),
        },
        Some(35) => a.dispatch(api.ntrip_mount_point_get()),
        Some(36) => a.dispatch(api.ntrip_mount_point_delete()),
        Some(37) => match args {
            [username, password] => a.dispatch(api.ntrip_credentials_set(username, password)),
            _ => usage("<option>, <username>, <password>"),
        },
        Some(38) => a.dispatch(api.ntrip_credentials_get()),
        Some(39) => a.dispatch(api.ntrip_credentials_delete()),
        Some(40) => match args {
            [gga_relay] => a.dispatch(api.ntrip_gga_relay_set(gga_relay)),
            _ => usage("<option>, <gga_relay>"),
        },
        Some(41) => a.dispatch(api.ntrip_gga_relay_get()),
        // 杂项
        Some(42) => match args {
            [enable] => a.dispatch(api.misc_dead_reckoning_set(enable)),
            _ => usage("<option>, <dead_reckoning>"),
        },
        Some(43) => a.dispatch(api.misc_dead_reckoning_get()),
        Some(44) => match args {
            [enable] => a.dispatch(api.misc_sd_log_set(enable)),
            _ => usage("<option>, <sd_log>"),
        },
        Some(45) => a.dispatch(api.misc_sd_log_get()),
        Some(46) => match args {
            [interface] => a.dispatch(api.misc_interface_set(interface)),
            _ => usage("<option>, <interface>"),
        },
        Some(47) => a.dispatch(api.misc_interface_get()),
        Some(48) => match args {
            [source] => a.dispatch(api.misc_correction_source_set(source)),
            _ => usage("<option>, <source>"),
        },
        Some(49) => a.dispatch(api.misc_correction_source_get()),
        Some(50) => match args {
            [module] => a.dispatch(api.misc_correction_module_set(module)),
            _ => usage("<option>, <module>"),
        },
        Some(51) => a.dispatch(api.misc_correction_module_get()),
        Some(52) => match args {
            [auto_start] => a.dispatch(api.misc_auto_start_set(auto_start)),
            _ => usage("<option>, <auto_start>"),
        },
        Some(53) => a.dispatch(api.misc_auto_start_get()),
        Some(54) => match args {
            [baudrate] => a.dispatch(api.misc_baudrate_set(baudrate)),
            _ => usage("<option>, <baudrate>"),
        },
        Some(55) => a.dispatch(api.misc_baudrate_get()),
        Some(56) => match args {
            [mode] => a.dispatch(api.misc_device_mode_set(mode)),
            _ => usage("<option>, <mode>"),
        },
        Some(57) => a.dispatch(api.misc_device_mode_get()),
        Some(58) => a.dispatch(api.misc_device_info_get()),
        Some(59) => a.dispatch(api.misc_location_get()),
        Some(60) => a.dispatch(api.misc_check_device()),
        Some(61) => a.dispatch(api.misc_restart_device()),
        Some(62) => a.dispatch(api.misc_factory_reset()),
        // 状态查询
        Some(63) => a.dispatch(api.status_wifi()),
        Some(64) => a.dispatch(api.status_cell()),
        Some(65) => a.dispatch(api.status_thingstream()),
        Some(66) => a.dispatch(api.status_ntrip()),
        Some(67) => a.dispatch(api.status_gnss()),
        // NVS 配置模式
        Some(68) => match args {
            [mode] => a.dispatch(api.misc_nvs_config_set(mode)),
            _ => usage("<option>, <MANUAL|AUTO|SAVE>"),
        },
        Some(69) => a.dispatch(api.misc_nvs_config_get()),
        _ => invalid_choice(),
    }
}

fn print_page(page: Page) {
    match page {
        Page::Main => {
            println!("\n[1] Config Device Settings.");
            println!("[2] Config Thingstream Settings.");
            println!("[3] Config NTRIP Settings.");
            println!("[4] HPG AT API.");
            println!("\n[q] Quit.");
        }
        Page::Device => {
            println!("\n[1] Load Settings from file.");
            println!("[2] Display Current Settings.");
            println!("[3] Set Device Communication Interface.");
            println!("[4] Read Device Communication Interface.");
            println!("[5] Set Wi-Fi Credentials.");
            println!("[6] Read Wi-Fi Credentials.");
            println!("[7] Set APN.");
            println!("[8] Read APN.");
            println!("[9] Set Correction Source.");
            println!("[10] Read Correction Source.");
            println!("[11] Set Correction Module.");
            println!("[12] Read Correction Module.");
            println!("[13] Set GNSS DR Option.");
            println!("[14] Read GNSS DR Option.");
            println!("[15] Set SD Log Option.");
            println!("[16] Read SD Log Option.");
            println!("\n[b] Back.");
            println!("[q] Quit.");
        }
        Page::Thingstream => {
            println!("\n[1] Load Settings from file.");
            println!("[2] Display Current Settings.");
            println!("[3] Set Broker Address.");
            println!("[4] Read Broker Address.");
            println!("[5] Set Client ID.");
            println!("[6] Read Client ID.");
            println!("[7] Set Key.");
            println!("[8] Read Key.");
            println!("[9] Set Cert.");
            println!("[10] Read Cert.");
            println!("[11] Set Root CA.");
            println!("[12] Read Root CA.");
            println!("[13] Set Plan.");
            println!("[14] Read Plan.");
            println!("[15] Set Region.");
            println!("[16] Read Region.");
            println!("\n[b] Back.");
            println!("[q] Quit.");
        }
        Page::Ntrip => {
            println!("\n[1] Load Settings from file.");
            println!("[2] Display Current Settings.");
            println!("[3] Set NTRIP Server Address.");
            println!("[4] Read NTRIP Server Address.");
            println!("[5] Set NTRIP Server User Agent.");
            println!("[6] Read NTRIP Server User Agent.");
            println!("[7] Set NTRIP Server Mount Point.");
            println!("[8] Read NTRIP Server Mount Point.");
            println!("[9] Set NTRIP Server Credentials.");
            println!("[10] Read NTRIP Server Credentials.");
            println!("[11] Set GGA Relay Option.");
            println!("[12] Read GGA Relay Option.");
            println!("\n[b] Back.");
            println!("[q] Quit.");
        }
        Page::Api => {
            println!("\n[1] Set Wi-Fi Credentials.");
            println!("[2] Get Wi-Fi Credentials.");
            println!("[3] Erase Wi-Fi Credentials.");
            println!("[4] Set Cellular APN.");
            println!("[5] Get Cellular APN.");
            println!("[6] Erase Cellular APN.");
            println!("[7] Set Thingstream Broker.");
            println!("[8] Get Thingstream Broker.");
            println!("[9] Erase Thingstream Broker.");
            println!("[10] Set Thingstream Client ID.");
            println!("[11] Get Thingstream Client ID.");
            println!("[12] Erase Thingstream Client ID.");
            println!("[13] Set Thingstream Certificate.");
            println!("[14] Get Thingstream Certificate.");
            println!("[15] Erase Thingstream Certificate.");
            println!("[16] Set Thingstream Key.");
            println!("[17] Get Thingstream Key.");
            println!("[18] Erase Thingstream Key.");
            println!("[19] Set Thingstream Plan.");
            println!("[20] Get Thingstream Plan.");
            println!("[21] Erase Thingstream Plan.");
            println!("[22] Set Thingstream Region.");
            println!("[23] Get Thingstream Region.");
            println!("[24] Erase Thingstream Region.");
            println!("[25] Set Root CA.");
            println!("[26] Get Root CA.");
            println!("[27] Erase Root CA.");
            println!("[28] Set NTRIP Server.");
            println!("[29] Get NTRIP Server.");
            println!("[30] Erase NTRIP Server.");
            println!("[31] Set NTRIP User Agent.");
            println!("[32] Get NTRIP User Agent.");
            println!("[33] Erase NTRIP User Agent.");
            println!("[34] Set NTRIP Mount Point.");
            println!("[35] Get NTRIP Mount Point.");
            println!("[36] Erase NTRIP Mount Point.");
            println!("[37] Set NTRIP Credentials.");
            println!("[38] Get NTRIP Credentials.");
            println!("[39] Erase NTRIP Credentials.");
            println!("[40] Set NTRIP GGA Relay.");
            println!("[41] Get NTRIP GGA Relay.");
            println!("[42] Set GNSS Dead Reckoning.");
            println!("[43] Get GNSS Dead Reckoning.");
            println!("[44] Set SD Log.");
            println!("[45] Get SD Log.");
            println!("[46] Set Interface.");
            println!("[47] Get Interface.");
            println!("[48] Set Correction Source.");
            println!("[49] Get Correction Source.");
            println!("[50] Set Correction Module.");
            println!("[51] Get Correction Module.");
            println!("[52] Set Auto Start.");
            println!("[53] Get Auto Start.");
            println!("[54] Set Baudrate.");
            println!("[55] Get Baudrate.");
            println!("[56] Set Device Mode.");
            println!("[57] Get Device Mode.");
            println!("[58] Get Board Info.");
            println!("[59] Get Location.");
            println!("[60] Check Device.");
            println!("[61] Restart Device.");
            println!("[62] Erase Device (Factory Reset).");
            println!("[63] Get Wi-Fi Status.");
            println!("[64] Get Cell Status.");
            println!("[65] Get Thingstream Status.");
            println!("[66] Get NTRIP Status.");
            println!("[67] Get GNSS Status.");
            println!("[68] Set NVS Config Mode.");
            println!("[69] Get NVS Config Mode.");
            println!("\n[b] Back.");
            println!("[q] Quit.");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_choice() {
        let (n, args) = split_choice("1, homeNet, secret1");
        assert_eq!(n, Some(1));
        assert_eq!(args, vec!["homeNet", "secret1"]);

        let (n, args) = split_choice("58");
        assert_eq!(n, Some(58));
        assert!(args.is_empty());

        let (n, _) = split_choice("not a number");
        assert_eq!(n, None);
    }
}
