//! Sample text in the shapes the parsers consume
//!
//! Record counts are listed next to each fixture so tests can assert on
//! them without re-deriving the parse.

/// 6 records: 2 errors, 1 warning (one malformed line is dropped)
pub const AUTH_LOG: &str = "\
2024-03-10T08:00:00 web01 sshd[2101]: Accepted publickey for deploy from 10.0.0.2 port 51022 ssh2
2024-03-10T08:01:12 web01 sshd[2107]: Failed password for root from 192.168.1.5 port 40112 ssh2
2024-03-10T08:01:15 web01 sshd[2107]: Failed password for root from 192.168.1.5 port 40112 ssh2
2024-03-10T08:02:00 web01 sudo[2200]: deploy : TTY=pts/0 ; PWD=/home/deploy ; USER=root ; COMMAND=/usr/bin/apt update
2024-03-10T08:03:30 web01 sshd[2107]: warning: possible break-in attempt from 192.168.1.5
-- rotated --
2024-03-10T08:05:00 web01 systemd-logind[640]: New session 42 of user deploy.
";

/// 4 records: 1 error, 1 warning. Year-less timestamps.
pub const SYSLOG: &str = "\
Mar 10 07:59:58 web01 systemd[1]: Started Daily apt download activities.
Mar 10 08:00:30 web01 CRON[3011]: (root) CMD (command -v debian-sa1 > /dev/null && debian-sa1 1 1)
Mar 10 08:04:00 web01 nginx[912]: upstream timed out, warn: retrying
Mar 10 08:06:10 web01 systemd[1]: backup.service: Failed with result 'exit-code'.
";

/// 2 records: 1 error
pub const KERN_LOG: &str = "\
2024-03-10T07:30:00 web01 kernel: [    0.000000] Linux version 6.1.0-18-amd64
2024-03-10T09:15:00 web01 kernel: EXT4-fs error (device sda1): reading directory lblock 0
";

/// 3 rules; the header lines and `[ 4]` (too few tokens) are dropped
pub const UFW_STATUS: &str = "\
Status: active

     To                         Action      From
     --                         ------      ----
[ 1] ALLOW IN    from 10.0.0.0/24 port 22 proto tcp
[ 2] ALLOW IN    port 443 proto tcp
[ 3] DENY IN     from 192.168.1.5
[ 4] LIMIT IN
";

/// 5 ports; the header and the IPv6 line are dropped
pub const SS_TULN: &str = "\
Netid State  Recv-Q Send-Q Local Address:Port Peer Address:Port Process
tcp   LISTEN 0      128    0.0.0.0:22         0.0.0.0:*
tcp   LISTEN 0      511    0.0.0.0:80         0.0.0.0:*
tcp   LISTEN 0      80     127.0.0.1:3306     0.0.0.0:*
udp   UNCONN 0      0      0.0.0.0:68         0.0.0.0:*
tcp   LISTEN 0      128    [::]:22            [::]:*
LISTEN_tcp 0 128 0 *:8080 *:*
";

/// 4 services; the trailing junk line is dropped
pub const SYSTEMCTL_UNITS: &str = "\
nginx.service             loaded active   running A high performance web server
ssh.service               loaded active   running OpenBSD Secure Shell server
backup.service            loaded failed   failed  Nightly backup
apt-daily.service         loaded inactive dead    Daily apt download activities
bogus
";
